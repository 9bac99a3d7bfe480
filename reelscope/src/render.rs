use anyhow::{Context, Result};
use chrono::Utc;
use tera::Tera;
use tracing::info;

use crate::processing::MovieRecord;

/// Directory holding the email template; the generated document lands next
/// to it, as the previous deployment expected.
pub const EMAIL_DIR: &str = "./email";

const TEMPLATE_NAME: &str = "template.html";
const OUTPUT_NAME: &str = "index.html";

/// Render the filtered collection into the HTML email body.
pub async fn render_email_html(movies: &[MovieRecord], template_dir: &str) -> Result<String> {
    let template_path = format!("{}/{}", template_dir, TEMPLATE_NAME);
    let source = tokio::fs::read_to_string(&template_path)
        .await
        .with_context(|| format!("failed to read email template: {}", template_path))?;

    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, &source)
        .context("failed to compile email template")?;

    let mut context = tera::Context::new();
    context.insert("movies", movies);
    context.insert("generated_at", &Utc::now().to_rfc2822());

    tera.render(TEMPLATE_NAME, &context)
        .context("failed to render email template")
}

/// Write the rendered document to the fixed artifact path, overwriting the
/// previous run's output. Returns the path written.
pub async fn write_index_html(html: &str, template_dir: &str) -> Result<String> {
    let path = format!("{}/{}", template_dir, OUTPUT_NAME);
    tokio::fs::write(&path, html)
        .await
        .with_context(|| format!("failed to write email body: {}", path))?;
    info!(path = %path, "email body written");
    Ok(path)
}

/// One human-readable line per record for console mode.
pub fn console_lines(movies: &[MovieRecord]) -> Vec<String> {
    movies
        .iter()
        .map(|m| format!("{} --- {}", m.clean_title, m.imdb_rating))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Quality;

    fn sample_movie(clean_title: &str) -> MovieRecord {
        MovieRecord {
            title: format!("{} [1080p]", clean_title),
            clean_title: clean_title.to_string(),
            quality: Some(Quality::Hd1080),
            imdb_rating: "IMDB Rating: 7.5/10".to_string(),
            synopsis: "A story.".to_string(),
            download_link: "http://example/dl".to_string(),
        }
    }

    // the in-repo template, resolved relative to this crate
    const TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../email");

    #[tokio::test]
    async fn template_renders_every_delivered_field() {
        let movies = vec![sample_movie("Movie Name"), sample_movie("Other Movie")];
        let html = render_email_html(&movies, TEMPLATE_DIR)
            .await
            .expect("render");

        assert!(html.contains("Movie Name"));
        assert!(html.contains("Other Movie"));
        assert!(html.contains("IMDB Rating: 7.5/10"));
        assert!(html.contains("A story."));
        assert!(html.contains("http://example/dl"));
    }

    #[tokio::test]
    async fn empty_collection_renders_the_placeholder() {
        let html = render_email_html(&[], TEMPLATE_DIR).await.expect("render");
        assert!(html.contains("No releases matched"));
    }

    #[test]
    fn console_lines_carry_clean_title_and_rating() {
        let lines = console_lines(&[sample_movie("Movie Name")]);
        assert_eq!(lines, ["Movie Name --- IMDB Rating: 7.5/10"]);
    }

    #[test]
    fn console_lines_of_empty_collection_are_empty() {
        assert!(console_lines(&[]).is_empty());
    }
}
