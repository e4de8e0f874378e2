//! Packaging captured images: file naming, ZIP archives and delivery.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use postcraft_core::Post;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{RenderError, RenderResult};
use crate::raster::ImageFormat;

/// MIME type of archives.
pub const ZIP_MIME: &str = "application/zip";

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn project(project_name: Option<&str>) -> Option<String> {
    project_name
        .map(sanitize)
        .filter(|name| !name.trim_matches('_').is_empty())
}

/// File name for a single exported post.
#[must_use]
pub fn single_file_name(post: &Post, project_name: Option<&str>, format: ImageFormat) -> String {
    let ext = format.extension();
    match project(project_name) {
        Some(project) => format!("{project}_post.{ext}"),
        None => format!("post-{}.{ext}", post.id),
    }
}

/// Entry names for a batch, in batch order.
///
/// Standalone posts are numbered `post-{n}.png` in order of appearance.
/// Carousel slides are numbered within their carousel by `slide_index`;
/// slides without one, or sharing one, keep batch order.
#[must_use]
pub fn batch_file_names<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<String> {
    let posts: Vec<&Post> = posts.into_iter().collect();

    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, post) in posts.iter().enumerate() {
        if let Some(carousel) = post.carousel_id.as_deref() {
            groups.entry(carousel).or_default().push(position);
        }
    }
    let mut slide_numbers = vec![0usize; posts.len()];
    for positions in groups.values_mut() {
        positions.sort_by_key(|&p| posts[p].slide_index.unwrap_or(u32::MAX));
        for (rank, &position) in positions.iter().enumerate() {
            slide_numbers[position] = rank + 1;
        }
    }

    let mut standalone = 0usize;
    posts
        .iter()
        .zip(slide_numbers)
        .map(|(post, slide)| match post.carousel_id.as_deref() {
            Some(carousel) => format!("carousel-{}-slide-{slide}.png", sanitize(carousel)),
            None => {
                standalone += 1;
                format!("post-{standalone}.png")
            }
        })
        .collect()
}

/// Archive name for a multi-post export.
#[must_use]
pub fn archive_name(project_name: Option<&str>) -> String {
    match project(project_name) {
        Some(project) => format!("{project}_posts.zip"),
        None => "posts.zip".to_string(),
    }
}

/// Archive name for a carousel export.
#[must_use]
pub fn carousel_archive_name(carousel_id: &str, project_name: Option<&str>) -> String {
    match project(project_name) {
        Some(project) => format!("{project}_carousel.zip"),
        None => format!("carousel-{}.zip", sanitize(carousel_id)),
    }
}

/// Bundle named blobs into one ZIP archive.
///
/// # Errors
///
/// Returns [`RenderError::Package`] if the archive cannot be written.
pub fn build_zip(entries: &[(String, Vec<u8>)]) -> RenderResult<Vec<u8>> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Receives finished files: the download step.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Deliver one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be delivered.
    async fn deliver(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> RenderResult<()>;
}

/// Writes downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Sink writing into `dir`, created on first delivery.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> RenderResult<()> {
        if file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(RenderError::Validation(format!(
                "Refusing to write file name {file_name}"
            )));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        let len = bytes.len();
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), mime, bytes = len, "download written");
        Ok(())
    }
}

/// A delivered file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name.
    pub file_name: String,
    /// MIME type.
    pub mime: String,
    /// Contents.
    pub bytes: Vec<u8>,
}

/// Keeps downloads in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    downloads: Arc<Mutex<Vec<Download>>>,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    #[must_use]
    pub fn downloads(&self) -> Vec<Download> {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn deliver(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> RenderResult<()> {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Download {
                file_name: file_name.to_string(),
                mime: mime.to_string(),
                bytes,
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postcraft_core::PostId;
    use std::io::Read;

    fn slide(carousel: &str, index: u32) -> Post {
        let mut post = Post::new();
        post.carousel_id = Some(carousel.to_string());
        post.slide_index = Some(index);
        post
    }

    #[test]
    fn test_single_file_names() {
        let post = Post::from_elements(PostId::from("abc"), Vec::new());
        assert_eq!(
            single_file_name(&post, None, ImageFormat::Png),
            "post-abc.png"
        );
        assert_eq!(
            single_file_name(&post, Some("Spring Sale"), ImageFormat::Jpeg),
            "Spring_Sale_post.jpg"
        );
        assert_eq!(
            single_file_name(&post, Some("  "), ImageFormat::Png),
            "post-abc.png"
        );
    }

    #[test]
    fn test_batch_names_are_sequential() {
        let posts = [Post::new(), slide("c1", 0), Post::new(), slide("c1", 1), Post::new()];
        assert_eq!(
            batch_file_names(&posts),
            vec![
                "post-1.png",
                "carousel-c1-slide-1.png",
                "post-2.png",
                "carousel-c1-slide-2.png",
                "post-3.png",
            ]
        );
    }

    #[test]
    fn test_slides_are_numbered_by_slide_index() {
        let posts = [slide("c", 1), Post::new(), slide("c", 0), slide("d", 0)];
        assert_eq!(
            batch_file_names(&posts),
            vec![
                "carousel-c-slide-2.png",
                "post-1.png",
                "carousel-c-slide-1.png",
                "carousel-d-slide-1.png",
            ]
        );
    }

    #[test]
    fn test_archive_names() {
        assert_eq!(archive_name(None), "posts.zip");
        assert_eq!(archive_name(Some("Launch")), "Launch_posts.zip");
        assert_eq!(carousel_archive_name("c1", None), "carousel-c1.zip");
    }

    #[test]
    fn test_zip_round_trip() {
        let entries = vec![
            ("post-1.png".to_string(), vec![1, 2, 3]),
            ("post-2.png".to_string(), vec![4, 5]),
        ];
        let bytes = build_zip(&entries).expect("zip");
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("archive");
        assert_eq!(archive.len(), 2);
        let mut contents = Vec::new();
        archive
            .by_name("post-2.png")
            .expect("entry")
            .read_to_end(&mut contents)
            .expect("read");
        assert_eq!(contents, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = DirectorySink::new(dir.path().join("out"));
        sink.deliver("post-1.png", "image/png", vec![9, 9])
            .await
            .expect("deliver");
        let written = std::fs::read(dir.path().join("out/post-1.png")).expect("read");
        assert_eq!(written, vec![9, 9]);

        let err = sink.deliver("../escape.png", "image/png", vec![]).await;
        assert!(matches!(err, Err(RenderError::Validation(_))));
    }

    #[tokio::test]
    async fn test_memory_sink_records() {
        let sink = MemorySink::new();
        sink.deliver("a.zip", ZIP_MIME, vec![1]).await.expect("deliver");
        let downloads = sink.downloads();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].mime, ZIP_MIME);
    }
}
