#![allow(dead_code)]

pub mod test_postgres;

use chrono::Utc;

use kuching::domain::{ConnectionId, ConnectionStatus, PbxConnection, TenantId};

pub const TEST_ENCRYPTION_KEY: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

pub const TEST_WEBHOOK_SECRET: &str = "whsec-test-1234";

pub fn pbx_connection(
    tenant_id: TenantId,
    password_encrypted: String,
) -> PbxConnection {
    let now = Utc::now();
    PbxConnection {
        id: ConnectionId::new(),
        tenant_id,
        host: "pbx.example.internal".to_string(),
        port: 8089,
        username: "cdrapi".to_string(),
        password_encrypted,
        verify_ssl: false,
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        status: ConnectionStatus::Active,
        last_error: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn cdr_body(uniqueid: &str, recording_file: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "uniqueid": uniqueid,
        "src": "15551230001",
        "dst": "2001",
        "start_time": "2025-11-03T14:21:07Z",
        "answer_time": "2025-11-03T14:21:12Z",
        "end_time": "2025-11-03T14:22:09Z",
        "duration": 62,
        "disposition": "ANSWERED",
        "recording_file": recording_file,
        "src_trunk_name": "sip-trunk-main",
        "dst_trunk_name": null,
    })
}
