use std::time::Duration;

pub(super) const fn default_z_index() -> i32 {
    2048
}

pub(super) fn default_container_layout() -> String {
    r#"<div style="padding:5px; margin:0px; width:400px;"></div>"#.to_string()
}

pub(super) fn default_message_layout() -> String {
    concat!(
        r#"<div style="border-radius:8px; box-shadow:0 0 5px rgba(51, 51, 51, 0.4); "#,
        r#"font-weight:bold; padding:10px; margin:8px 5px;"></div>"#
    )
    .to_string()
}

/// Durée d'un fondu "rapide".
pub(super) const fn default_fade() -> Duration {
    Duration::from_millis(200)
}
