//! Generated documents beyond the HTML pages: sitemap and SEO metadata

mod seo;
mod sitemap;

pub use seo::{blog_posting, canonical_url, og_image, PageMeta, OG_IMAGE_HEIGHT, OG_IMAGE_WIDTH};
pub use sitemap::{build_sitemap, render_sitemap, sitemap_entries, ChangeFreq, SitemapEntry};
