use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct HackRxRequest {
    pub documents: Url,
    pub questions: Vec<String>,
}
