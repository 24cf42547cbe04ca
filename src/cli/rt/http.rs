use bytes::Bytes;
use reqwest::{Client, Request};
use tuition_core::http::response::Response;
use tuition_core::HttpIO;

#[derive(Default, Clone)]
pub struct NativeHttp {
    client: Client,
}

#[async_trait::async_trait]
impl HttpIO for NativeHttp {
    async fn execute(&self, request: Request) -> anyhow::Result<Response<Bytes>> {
        log::debug!(
            "{} {} {:?}",
            request.method(),
            request.url(),
            request.version()
        );
        let response = self.client.execute(request).await?;
        log::debug!("response: {:?}", response);

        Response::from_reqwest(response).await
    }
}
