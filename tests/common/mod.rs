#![allow(dead_code)]

use artist_conversions::{ClientConfig, HttpRequest, HttpResponse, Result, StatsError, Transport};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

type Matcher = Box<dyn Fn(&HttpRequest) -> bool + Send + Sync>;
type Responder = Box<dyn Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync>;

struct Route {
    matcher: Matcher,
    responder: Responder,
}

/// Route-table transport that records every request it sees.
///
/// Routes are checked in the order they were added; the first match
/// answers. A responder returning `None` simulates a transport failure.
/// Unmatched requests get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose URL contains `fragment` with a fixed response.
    pub fn route(self, fragment: &str, status: u16, body: impl Into<String>) -> Self {
        let fragment = fragment.to_string();
        let body = body.into();
        self.route_fn(
            move |req| req.url.contains(&fragment),
            move |_| Some(HttpResponse::new(status, body.clone())),
        )
    }

    /// Fail requests whose URL contains `fragment` at the transport level.
    pub fn fail(self, fragment: &str) -> Self {
        let fragment = fragment.to_string();
        self.route_fn(move |req| req.url.contains(&fragment), |_| None)
    }

    pub fn route_fn(
        mut self,
        matcher: impl Fn(&HttpRequest) -> bool + Send + Sync + 'static,
        responder: impl Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        self.routes.push(Route {
            matcher: Box::new(matcher),
            responder: Box::new(responder),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of recorded requests whose URL contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|req| req.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.routes.iter().find(|route| (route.matcher)(&request)) {
            Some(route) => (route.responder)(&request)
                .ok_or_else(|| StatsError::Http(format!("simulated failure for {}", request.url))),
            None => Ok(HttpResponse::new(404, "no route")),
        }
    }
}

pub const BASE: &str = "http://fake.test";

/// Config pointing every provider at the fake host, with no scrape pause.
pub fn test_config() -> ClientConfig {
    ClientConfig::new()
        .with_base_url(BASE)
        .with_scrape_pause(Duration::ZERO)
}

/// Decoded value of query parameter `name`.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != name {
            return None;
        }
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}

/// A search listing page of `ids`, all published mid-2023.
pub fn search_page(ids: &[String], next_page_token: Option<&str>) -> String {
    let items: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"kind":"youtube#searchResult","id":{{"kind":"youtube#video","videoId":"{id}"}},"snippet":{{"publishedAt":"2023-06-15T12:00:00Z","title":"Video {id}"}}}}"#
            )
        })
        .collect();
    match next_page_token {
        Some(token) => format!(
            r#"{{"kind":"youtube#searchListResponse","nextPageToken":"{token}","items":[{}]}}"#,
            items.join(",")
        ),
        None => format!(
            r#"{{"kind":"youtube#searchListResponse","items":[{}]}}"#,
            items.join(",")
        ),
    }
}

pub fn video_ids(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

/// Responds to a `videos?id=...` request with the same stats for every id.
pub fn uniform_video_stats(views: u64, likes: u64, comments: u64) -> impl Fn(&HttpRequest) -> Option<HttpResponse> {
    move |req| {
        let ids = query_param(&req.url, "id").unwrap_or_default();
        let items: Vec<String> = ids
            .split(',')
            .filter(|id| !id.is_empty())
            .map(|id| {
                format!(
                    r#"{{"id":"{id}","statistics":{{"viewCount":"{views}","likeCount":"{likes}","commentCount":"{comments}"}}}}"#
                )
            })
            .collect();
        Some(HttpResponse::new(
            200,
            format!(r#"{{"items":[{}]}}"#, items.join(",")),
        ))
    }
}

pub fn is_video_listing(req: &HttpRequest) -> bool {
    req.url.contains("/youtube/v3/search?") && req.url.contains("type=video")
}

pub fn is_video_stats(req: &HttpRequest) -> bool {
    req.url.contains("/youtube/v3/videos?")
}
