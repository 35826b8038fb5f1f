use super::*;

fn status(title: &str, timestamp: &str) -> PlaybackStatus {
    PlaybackStatus {
        status: "playing".into(),
        network_name: "WXYZ".into(),
        channel_number: 4,
        timestamp: timestamp.into(),
        title: title.into(),
    }
}

#[test]
fn renders_every_status_field() {
    let page = render(&status("News", "2024-01-01T00:00:00Z")).expect("page");
    assert!(page.contains("<title>Cable Box Control</title>"));
    assert!(page.contains(r#"<span id="status">playing</span>"#));
    assert!(page.contains(r#"<span id="network">WXYZ</span>"#));
    assert!(page.contains(r#"<span id="channel">4</span>"#));
    assert!(page.contains(r#"<span id="title">News</span>"#));
    assert!(page.contains(r#"<span id="timestamp">2024-01-01 00:00:00 UTC</span>"#));
}

#[test]
fn escapes_device_supplied_text() {
    let page = render(&status("<script>alert('x')</script> & more", "now")).expect("page");
    assert!(page.contains("&lt;script&gt;alert("));
    assert!(page.contains("&amp; more"));
    assert!(!page.contains("<script>alert"));
}

#[test]
fn placeholder_text_in_values_is_rendered_literally() {
    let mut snapshot = status("SECRET-TITLE", "now");
    snapshot.status = "{{title}}".into();
    snapshot.network_name = "{{ status.title }}".into();

    let page = render(&snapshot).expect("page");
    assert!(page.contains(r#"<span id="status">{{title}}</span>"#));
    assert!(page.contains(r#"<span id="network">{{ status.title }}</span>"#));
    assert_eq!(page.matches("SECRET-TITLE").count(), 1);
}

#[test]
fn timestamps_are_normalized_to_utc_when_possible() {
    assert_eq!(
        display_timestamp("2024-06-01T12:30:00+02:00"),
        "2024-06-01 10:30:00 UTC"
    );
    assert_eq!(display_timestamp("yesterday"), "yesterday");
}
