use super::*;
use crate::fake_backend::{FakeBackend, FakeResponse};
use axum::http::Method;
use serde_json::json;

fn plate_json(id: i64, path: &str) -> serde_json::Value {
    json!({
        "PlateID": id,
        "Path": path,
        "LayersCount": 200,
        "PrintTime": 2330.4,
        "LayerThickness": 0.05,
        "UsedMaterial": 8.5,
        "Size": 1024,
        "CreatedDate": 1_700_000_000
    })
}

async fn daemon_with_plates(count: i64) -> (FakeBackend, DaemonClient) {
    let fake = FakeBackend::spawn().await;
    let plates: Vec<_> = (1..=count)
        .map(|id| plate_json(id, &format!("plates/part-{id}.zip")))
        .collect();
    fake.respond_json("/plates/list/json", json!(plates)).await;
    let client = DaemonClient::new(fake.transport());
    (fake, client)
}

#[tokio::test]
async fn status_converts_microns_and_derives_label() {
    let fake = FakeBackend::spawn().await;
    fake.respond_json(
        "/status",
        json!({
            "Printing": false,
            "Paused": false,
            "State": 4,
            "LayerID": 12,
            "LayersCount": 48,
            "CurrentHeight": 12500,
            "Path": "plates/part-1.zip",
            "Temp": 28.5
        }),
    )
    .await;
    let client = DaemonClient::new(fake.transport());

    let snapshot = client.status().await.expect("status");

    assert_eq!(
        snapshot.raw,
        RawStatus::new(false, false, "Canceling", STATE_CANCELING)
    );
    assert_eq!(snapshot.z_mm, 12.5);
    assert_eq!(snapshot.layer, Some(12));
    assert_eq!(snapshot.layer_count, Some(48));
    assert_eq!(snapshot.file_path.as_deref(), Some("plates/part-1.zip"));
    assert_eq!(snapshot.temperature_c, Some(28.5));
}

#[tokio::test]
async fn idle_status_drops_stale_job_fields() {
    let fake = FakeBackend::spawn().await;
    fake.respond_json(
        "/status",
        json!({
            "Printing": false,
            "Paused": false,
            "State": 0,
            "LayerID": 48,
            "LayersCount": 48,
            "Path": "plates/part-1.zip"
        }),
    )
    .await;
    let client = DaemonClient::new(fake.transport());

    let snapshot = client.status().await.expect("status");

    assert_eq!(snapshot.raw.state, "Idle");
    assert!(snapshot.layer.is_none());
    assert!(snapshot.file_path.is_none());
    assert!(snapshot.progress().is_none());
}

#[tokio::test]
async fn start_print_resolves_plate_id_from_path() {
    let (fake, client) = daemon_with_plates(3).await;

    client
        .start_print(FileLocation::Local, "plates/part-2.zip")
        .await
        .expect("start");

    assert_eq!(
        fake.paths().await,
        vec!["/plates/list/json", "/printer/start/2"]
    );
}

#[tokio::test]
async fn unknown_plate_path_is_not_found() {
    let (fake, client) = daemon_with_plates(2).await;

    let err = client
        .delete_file(FileLocation::Local, "plates/missing.zip")
        .await
        .expect_err("missing plate");

    assert!(matches!(err, BackendError::NotFound { .. }));
    assert_eq!(fake.paths().await, vec!["/plates/list/json"]);
}

#[tokio::test]
async fn usb_location_is_unsupported() {
    let (fake, client) = daemon_with_plates(2).await;

    let err = client
        .list_files(FileLocation::Usb, None, 0, 10)
        .await
        .expect_err("usb");

    assert!(matches!(
        err,
        BackendError::Unsupported {
            backend: BackendKind::Daemon,
            ..
        }
    ));
    assert!(fake.requests().await.is_empty());
}

#[tokio::test]
async fn list_files_pages_client_side() {
    let (_fake, client) = daemon_with_plates(5).await;

    let middle = client
        .list_files(FileLocation::Local, None, 1, 2)
        .await
        .expect("page 1");
    let last = client
        .list_files(FileLocation::Local, None, 2, 2)
        .await
        .expect("page 2");

    let names: Vec<_> = middle
        .files
        .iter()
        .map(|file| file.file_data.name.as_str())
        .collect();
    assert_eq!(names, vec!["part-3.zip", "part-4.zip"]);
    assert_eq!(middle.next_index, Some(2));
    assert_eq!(last.files.len(), 1);
    assert_eq!(last.next_index, None);
    assert_eq!(middle.files[0].print_time, 2330);
    assert_eq!(middle.files[0].file_data.last_modified.timestamp(), 1_700_000_000);
}

#[tokio::test]
async fn thumbnail_reads_plate_preview() {
    let (fake, client) = daemon_with_plates(2).await;
    fake.respond("/static/plates/1/3d.png", FakeResponse::Bytes(vec![1, 2, 3]))
        .await;

    let bytes = client
        .thumbnail(FileLocation::Local, "plates/part-1.zip")
        .await
        .expect("thumbnail");

    assert_eq!(bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn moves_are_issued_as_relative_micron_steps() {
    let fake = FakeBackend::spawn().await;
    fake.respond_json(
        "/status",
        json!({ "Printing": false, "Paused": false, "State": 0, "CurrentHeight": 10000 }),
    )
    .await;
    let client = DaemonClient::new(fake.transport());

    client.move_to(12.5).await.expect("absolute");
    client.move_by(-0.5).await.expect("relative");
    client.move_by(0.0).await.expect("no-op");

    assert_eq!(
        fake.paths().await,
        vec![
            "/status",
            "/z-axis/move/up/micron/2500",
            "/z-axis/move/down/micron/500"
        ]
    );
}

#[tokio::test]
async fn motion_and_projector_routes() {
    let fake = FakeBackend::spawn().await;
    let client = DaemonClient::new(fake.transport());

    assert!(client.capabilities().move_to_top);
    client.move_to_top().await.expect("top");
    client.home().await.expect("home");
    client.set_curing(true).await.expect("cure on");
    client.set_curing(false).await.expect("cure off");
    client
        .display_test(DisplayTest::Grid)
        .await
        .expect("display test");
    client.emergency_stop().await.expect("stop");

    assert_eq!(
        fake.paths().await,
        vec![
            "/z-axis/top",
            "/z-axis/calibrate",
            "/projector/white",
            "/projector/blank",
            "/projector/test/grid",
            "/printer/force-stop"
        ]
    );
}

#[tokio::test]
async fn create_profile_sends_daemon_units() {
    let fake = FakeBackend::spawn().await;
    fake.respond_json(
        "/profile/add",
        json!({
            "ProfileID": 9,
            "Title": "Grey resin",
            "Depth": 50,
            "CureTime": 2.5,
            "SupportCureTime": 30.0,
            "SupportLayerNumber": 4
        }),
    )
    .await;
    let client = DaemonClient::new(fake.transport());
    let draft = ProfileDraft {
        name: "Grey resin".into(),
        layer_height_mm: 0.05,
        exposure_s: 2.5,
        bottom_exposure_s: 30.0,
        bottom_layers: 4,
    };

    let profile = client.create_profile(&draft).await.expect("create");

    assert_eq!(profile.id, ProfileId(9));
    assert_eq!(profile.settings, draft);

    let requests = fake.requests().await;
    assert_eq!(requests[0].method, Method::POST);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert_eq!(sent["Depth"], json!(50));
    assert_eq!(sent["Title"], json!("Grey resin"));
    assert!(sent.get("ProfileID").is_none());
}

#[tokio::test]
async fn profile_update_and_delete_address_profile_id() {
    let fake = FakeBackend::spawn().await;
    let client = DaemonClient::new(fake.transport());
    let profile = Profile {
        id: ProfileId(4),
        settings: ProfileDraft {
            name: "Clear".into(),
            layer_height_mm: 0.1,
            exposure_s: 3.0,
            bottom_exposure_s: 35.0,
            bottom_layers: 5,
        },
    };

    client.update_profile(&profile).await.expect("update");
    client.delete_profile(profile.id).await.expect("delete");

    let requests = fake.requests().await;
    assert_eq!(requests[0].path, "/profile/edit/4");
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert_eq!(sent["ProfileID"], json!(4));
    assert_eq!(sent["Depth"], json!(100));
    assert_eq!(requests[1].path, "/profile/delete/4");
}

#[tokio::test]
async fn heater_round_trip() {
    let fake = FakeBackend::spawn().await;
    fake.respond_json("/heater", json!({ "Current": 24.0, "Target": 30.0 }))
        .await;
    let client = DaemonClient::new(fake.transport());

    let temperature = client.temperature().await.expect("temperature");
    client.set_temperature(32.5).await.expect("set");

    assert_eq!(temperature.current_c, 24.0);
    assert_eq!(temperature.target_c, Some(30.0));
    assert_eq!(fake.paths().await, vec!["/heater", "/heater/target/32.5"]);
}

#[tokio::test]
async fn analytics_maps_short_keys() {
    let fake = FakeBackend::spawn().await;
    fake.respond_json(
        "/analytic/data/1",
        json!([{ "T": 1_700_000_000, "K": "resin_level", "V": 0.8 }]),
    )
    .await;
    let client = DaemonClient::new(fake.transport());

    let samples = client.analytics(1).await.expect("analytics");

    assert_eq!(samples[0].metric, "resin_level");
    assert_eq!(samples[0].value, 0.8);
}
