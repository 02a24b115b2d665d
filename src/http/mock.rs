//! 测试用模拟客户端：按URL返回预设响应，记录调用次数与完成顺序

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{HttpClient, HttpResponse, TransportError};

struct MockRoute {
    outcome: Result<HttpResponse, TransportError>,
    delay: Duration,
}

#[derive(Default)]
pub(crate) struct MockHttpClient {
    routes: HashMap<String, MockRoute>,
    calls: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 最终地址与请求地址相同的响应
    pub(crate) fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.respond_with(url, HttpResponse::new(status, url, body))
    }

    pub(crate) fn respond_with(mut self, url: &str, response: HttpResponse) -> Self {
        self.routes.insert(
            url.to_string(),
            MockRoute { outcome: Ok(response), delay: Duration::ZERO },
        );
        self
    }

    pub(crate) fn fail(mut self, url: &str, err: TransportError) -> Self {
        self.routes.insert(
            url.to_string(),
            MockRoute { outcome: Err(err), delay: Duration::ZERO },
        );
        self
    }

    /// 为已登记的路由设置响应延迟
    pub(crate) fn delay(mut self, url: &str, delay: Duration) -> Self {
        if let Some(route) = self.routes.get_mut(url) {
            route.delay = delay;
        }
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 按完成先后排列的请求地址
    pub(crate) fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(route) = self.routes.get(url) else {
            return Err(TransportError::Connect(format!("no mock route for {}", url)));
        };
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        self.completed.lock().unwrap().push(url.to_string());
        route.outcome.clone()
    }
}
