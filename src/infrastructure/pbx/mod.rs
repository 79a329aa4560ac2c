mod http_pbx_client;

pub use http_pbx_client::HttpPbxClient;
