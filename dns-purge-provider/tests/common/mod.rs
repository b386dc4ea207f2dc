//! 共享测试工具和辅助函数

#![allow(dead_code)]

use dns_purge_provider::{AccountRef, InMemoryCloudApi, RecordSet, ResourceRecord, ResourceType};

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Err`，并解包返回错误值。
#[macro_export]
macro_rules! require_err {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_err(), "expected Err(..), got {res:?}");
        let Err(err) = res else {
            return;
        };
        err
    }};
}

pub fn test_account() -> AccountRef {
    AccountRef::new("111122223333", "us-east-1")
}

/// 一个私有域名：一个 VPC 关联、三条普通记录、一条记录引用健康检查
pub fn private_zone_account() -> InMemoryCloudApi {
    let api = InMemoryCloudApi::new(test_account());
    api.add_private_zone("Z1", "internal.example.", &["vpc-1"]);
    api.add_health_check("hc-1", "internal-web");
    api.add_record_set(
        "Z1",
        RecordSet::new("web.internal.example.", "A").with_health_check("hc-1"),
    );
    api.add_record_set("Z1", RecordSet::new("api.internal.example.", "CNAME"));
    api.add_record_set("Z1", RecordSet::new("internal.example.", "TXT"));
    api
}

pub fn record_set(zone_id: &str, record_set: &RecordSet) -> ResourceRecord {
    ResourceRecord::new(
        ResourceType::HostedZoneRecordSet,
        dns_purge_provider::record_set_id(zone_id, record_set),
        &record_set.name,
        &test_account(),
    )
    .with_zone(zone_id)
}

pub fn resource(resource_type: ResourceType, id: &str) -> ResourceRecord {
    ResourceRecord::new(resource_type, id, id, &test_account())
}
