//! End-to-end conversions through a live service and a mock provider.

use axum::http::StatusCode;

mod common;

const CLASH_SUB: &str = r#"proxies:
  - name: HK-1
    type: ss
    server: a.example.com
    port: 443
    cipher: aes-128-gcm
    password: x
  - name: JP-1
    type: ss
    server: b.example.com
    port: 443
    cipher: aes-128-gcm
    password: x
  - name: US-1
    type: ss
    server: c.example.com
    port: 443
    cipher: aes-128-gcm
    password: x
"#;

const CLASH_TEMPLATE: &str = r#"port: 7890
socks-port: 7891
mode: rule
proxies: []
proxy-groups:
  - name: Select
    type: select
    proxies:
      - Auto
      - $all
  - name: Auto
    type: url-test
    url: http://connect.example/generate_204
    interval: 300
    proxies:
      - /^JP/
  - name: Fallback
    type: fallback
    proxies: []
rules:
  - MATCH,Select
"#;

const SURGE_SUB: &str = "#!MANAGED-CONFIG {url} interval=86400 strict=true\n\
# provider: example\n\
\n\
[Proxy]\n\
HK-1 = ss, a.example.com, 443, encrypt-method=aes-128-gcm, password=x\n\
US-1 = ss, c.example.com, 443, encrypt-method=aes-128-gcm, password=x\n\
DIRECT-LINE = direct\n\
\n\
[Panel]\n\
Account = title=Demo, content=expires soon\n";

const SURGE_TEMPLATE: &str = "#!MANAGED-CONFIG {url} interval=43200\n\
\n\
[General]\n\
loglevel = notify\n\
dns-server = system\n\
\n\
[Proxy]\n\
Seed = direct\n\
\n\
[Proxy Group]\n\
Main = select, $all\n\
Auto = url-test, /^HK/, url=http://connect.example/generate_204, interval=300\n\
\n\
[Rule]\n\
FINAL,Main\n";

#[tokio::test]
async fn test_clash_conversion_end_to_end() {
    let upstream = common::start_mock_upstream(
        "200 OK",
        "Subscription-Userinfo: upload=1; download=2; total=3\r\n\
         Profile-Update-Interval: 24\r\n\
         X-Provider-Note: internal\r\n",
        CLASH_SUB,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.yaml"), CLASH_TEMPLATE).unwrap();
    let addr = common::start_service(
        dir.path(),
        vec![common::app("demo", "alpha-token", Some("demo.yaml"), None)],
    )
    .await;

    let sub_url = upstream.url("/sub");
    let res = common::client()
        .get(format!("http://{}/sub", addr))
        .query(&[("apptoken", "alpha-token"), ("url", sub_url.as_str())])
        .header("user-agent", "clash-verge/1.6.2")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["subscription-userinfo"],
        "upload=1; download=2; total=3"
    );
    assert_eq!(res.headers()["profile-update-interval"], "24");
    assert!(res.headers().get("x-provider-note").is_none());

    let body = res.text().await.unwrap();
    assert!(!body.contains("$all"));
    assert!(!body.contains("/^JP/"));

    let value: serde_yaml::Value = serde_yaml::from_str(&body).unwrap();
    assert_eq!(value["port"].as_u64(), Some(7890));
    assert_eq!(value["proxies"].as_sequence().unwrap().len(), 3);
    assert_eq!(value["proxies"][0]["name"].as_str(), Some("HK-1"));

    let groups = value["proxy-groups"].as_sequence().unwrap();
    let names = |at: usize| -> Vec<String> {
        groups[at]["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(names(0), ["Auto", "HK-1", "JP-1", "US-1"]);
    assert_eq!(names(1), ["JP-1"]);
    assert_eq!(names(2), ["HK-1", "JP-1", "US-1"]);

    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn test_surge_conversion_end_to_end() {
    let upstream = common::start_mock_upstream(
        "200 OK",
        "Content-Disposition: attachment; filename=demo.conf\r\n\
         Subscription-Userinfo: upload=9\r\n",
        SURGE_SUB,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.conf"), SURGE_TEMPLATE).unwrap();
    let addr = common::start_service(
        dir.path(),
        vec![common::app(
            "demo",
            "beta-token",
            None,
            Some("demo.conf"),
        )],
    )
    .await;

    let sub_url = upstream.url("/sub");
    let res = common::client()
        .get(format!("http://{}/sub", addr))
        .query(&[("apptoken", "beta-token"), ("url", sub_url.as_str())])
        .header("user-agent", "Surge iOS/2989")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=demo.conf"
    );
    assert!(res.headers().get("subscription-userinfo").is_none());

    let body = res.text().await.unwrap();
    let first_line = body.lines().next().unwrap();
    // The original's directive wins and its placeholder becomes the URL
    // this request was served on.
    assert!(first_line.starts_with("#!MANAGED-CONFIG http://"));
    assert!(first_line.contains("apptoken=beta-token"));
    assert!(first_line.ends_with("interval=86400 strict=true"));
    assert!(!body.contains("interval=43200"));

    assert!(body.contains("HK-1 = ss, a.example.com"));
    assert!(!body.contains("DIRECT-LINE"));
    assert!(!body.contains("Seed"));
    assert!(body.contains("Main = select, HK-1, US-1"));
    assert!(body.contains(
        "Auto = url-test, HK-1, url=http://connect.example/generate_204, interval=300"
    ));
    assert!(body.contains("[Panel]\nAccount = title=Demo, content=expires soon"));

    assert_eq!(upstream.hits(), 1);
}

#[tokio::test]
async fn test_unrecognized_client_gets_raw_document() {
    let upstream = common::start_mock_upstream(
        "200 OK",
        "Subscription-Userinfo: upload=5\r\n",
        CLASH_SUB,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.yaml"), CLASH_TEMPLATE).unwrap();
    let addr = common::start_service(
        dir.path(),
        vec![common::app("demo", "alpha-token", Some("demo.yaml"), None)],
    )
    .await;

    // Root path serves the same endpoint as /sub.
    let sub_url = upstream.url("/sub");
    let res = common::client()
        .get(format!("http://{}/", addr))
        .query(&[("apptoken", "alpha-token"), ("url", sub_url.as_str())])
        .header("user-agent", "curl/8.4.0")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["subscription-userinfo"], "upload=5");
    let body = res.text().await.unwrap();
    assert_eq!(body, CLASH_SUB);
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let addr = common::start_service(
        dir.path(),
        vec![common::app("demo", "alpha-token", Some("demo.yaml"), None)],
    )
    .await;

    let res = common::client()
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&res.text().await.unwrap()).unwrap();
    assert_eq!(body["status"].as_str(), Some("ok"));
}
