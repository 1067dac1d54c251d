//! Waiting for replaced content before the page is measured.

use crate::fragment::PageFragment;
use futures::future::{self, LocalBoxFuture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Loaded,
    Failed,
}

/// Resolves once the resource at `src` can be measured.
pub trait AssetLoader {
    fn ready(&self, src: &str) -> LocalBoxFuture<'_, AssetState>;
}

/// Treats every resource as already loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadyAssets;

impl AssetLoader for ReadyAssets {
    fn ready(&self, _src: &str) -> LocalBoxFuture<'_, AssetState> {
        Box::pin(future::ready(AssetState::Loaded))
    }
}

/// Sources of every `img[src]` on the page, in document order.
pub fn image_sources(page: &PageFragment) -> Vec<String> {
    page.descendants(page.root())
        .filter(|&n| page.has_tag(n, "img"))
        .filter_map(|n| page.attr(n, "src").map(str::to_string))
        .collect()
}

/// Waits for all images on the page. Failures are logged, never fatal.
pub async fn wait_for_images<L>(loader: &L, page: &PageFragment)
where
    L: AssetLoader + ?Sized,
{
    let sources = image_sources(page);
    if sources.is_empty() {
        return;
    }
    let states = future::join_all(sources.iter().map(|src| loader.ready(src))).await;
    for (src, state) in sources.iter().zip(states) {
        if state == AssetState::Failed {
            log::warn!("Image '{}' failed to load; measuring it as is.", src);
        }
    }
}
