use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

const COUNT_FILL: &str = "#0e75b6";
const ERROR_FILL: &str = "#b60e0e";

fn render(width: u32, fill: &str, text: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="20" viewBox="0 0 {width} 20">
    <rect width="{width}" height="20" fill="{fill}" rx="3"/>
    <text x="{mid}" y="14" font-family="Arial" font-size="12" fill="white" text-anchor="middle">{text}</text>
</svg>
"#,
        mid = width / 2,
    )
}

// Blue 150x20 badge with the view count
pub fn count_badge(count: u64) -> String {
    render(150, COUNT_FILL, &format!("Profile views: {count}"))
}

// Red 350x20 badge with a fixed message
pub fn error_badge(message: &str) -> String {
    render(350, ERROR_FILL, message)
}

// SVG response that embedding proxies should not cache
pub fn svg_response(status: StatusCode, svg: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        svg,
    )
        .into_response()
}
