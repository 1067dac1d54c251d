use crate::config::QuireConfig;
use crate::error::QuireError;
use quire_dom::SourceTree;
use quire_layout::{
    BreakTokens, FlowMetrics, GeometryOracle, Layout, PageFragment, after_page_layout,
};

/// Chains page passes over one source: each page's break token seeds the
/// next, and the table repair runs between them.
pub struct Paginator<O> {
    layout: Layout<O>,
    max_pages: usize,
}

impl Paginator<FlowMetrics> {
    /// A paginator measuring with the reference metrics.
    pub fn from_config(config: &QuireConfig) -> Result<Self, QuireError> {
        config.validate()?;
        let bounds = config.page.bounds()?;
        let metrics = FlowMetrics::for_bounds(config.metrics, &bounds);
        let layout = Layout::new(metrics, bounds, config.layout);
        Ok(Self::new(layout, config.max_pages))
    }
}

impl<O: GeometryOracle> Paginator<O> {
    pub fn new(layout: Layout<O>, max_pages: usize) -> Self {
        Self { layout, max_pages }
    }

    pub fn layout(&self) -> &Layout<O> {
        &self.layout
    }

    /// For registering hooks or an asset loader before a run.
    pub fn layout_mut(&mut self) -> &mut Layout<O> {
        &mut self.layout
    }

    /// Lays out the whole source.
    pub async fn paginate(&mut self, source: &SourceTree) -> Result<Vec<PageFragment>, QuireError> {
        let mut pages: Vec<PageFragment> = Vec::new();
        let mut token: Option<BreakTokens> = None;
        loop {
            if pages.len() >= self.max_pages {
                return Err(QuireError::PageLimit(self.max_pages));
            }
            let rendered = self.layout.render_page(source, token.as_ref()).await?;
            let mut fragment = rendered.fragment;
            after_page_layout(
                source,
                pages.last_mut(),
                &mut fragment,
                rendered.break_token.as_ref(),
            )?;
            log::debug!(
                "Page {} done, {} characters",
                pages.len() + 1,
                fragment.text().chars().count()
            );
            pages.push(fragment);

            match rendered.break_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        log::info!("Paginated into {} page(s)", pages.len());
        Ok(pages)
    }
}
