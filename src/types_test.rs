use super::*;
use serde_json::json;

#[test]
fn server_list_parses_guilds_and_ignores_extra_fields() {
    let list: ServerList = serde_json::from_value(json!({
        "guilds": [
            { "id": "1", "name": "alpha", "icon_url": null, "extra": 5 },
            { "id": "2", "name": "beta" }
        ]
    }))
    .expect("parse");
    assert_eq!(list.guilds.len(), 2);
    assert_eq!(list.guilds[0].name, "alpha");
    assert_eq!(list.guilds[1].icon_url, None);
}

#[test]
fn channel_reads_type_field_as_kind() {
    let channel: Channel =
        serde_json::from_value(json!({ "id": "10", "name": "general", "type": 0, "guild_id": "1" })).expect("parse");
    assert_eq!(channel.kind, Some(0));
    assert_eq!(channel.guild_id.as_deref(), Some("1"));
}

#[test]
fn null_channel_maps_to_none() {
    let channel: Option<Channel> = serde_json::from_value(serde_json::Value::Null).expect("parse");
    assert!(channel.is_none());
}

#[test]
fn authentication_tolerates_missing_optional_fields() {
    let auth: Authentication = serde_json::from_value(json!({
        "user": { "id": "5", "username": "someone" },
        "scopes": ["rpc"]
    }))
    .expect("parse");
    assert_eq!(auth.user.expect("user").username, "someone");
    assert_eq!(auth.scopes, vec!["rpc".to_owned()]);
    assert!(auth.application.is_none());
}

#[test]
fn authorization_requires_code() {
    assert!(serde_json::from_value::<Authorization>(json!({})).is_err());
}
