pub mod html;


/// Pages whose URL points at a non-HTML asset carry no links worth following
pub fn should_extract_links(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    ![
        ".txt", ".yaml", ".yml", ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".css", ".js",
    ]
    .iter()
    .any(|ext| path.ends_with(ext))
}
