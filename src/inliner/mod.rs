//! Resource inlining engine.
//!
//! Turns a rendered page into one self-contained HTML document: consent
//! banners and scripts are removed, stylesheets become inline `<style>`
//! blocks (with their own `url(...)` references embedded), images become
//! data URIs, iframes are re-rendered and inlined recursively, and linked
//! PDFs get their extracted text appended next to the anchor.
//!
//! Each document pass works in three phases so the DOM never crosses an
//! await point: parse-prune-collect, fetch (stylesheets and images
//! concurrently, iframes sequentially), then a single re-parse that applies
//! every replacement in document order. Per-resource failures degrade to a
//! logged warning with the original reference left in place; partial
//! inlining is a success, not an error.

pub mod css;
pub(crate) mod downloaders;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, join_all};
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::config::SnapshotConfig;
use crate::pdf;
use crate::renderer::PageRenderer;

// Prefix match: declarations like `overflow: hidden !important` are
// scroll locks too and get stripped with the plain form.
static OVERFLOW_HIDDEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^overflow\s*:\s*hidden").expect("overflow pattern is valid"));

/// Resolve a potentially relative URL against a base URL.
pub(crate) fn resolve_url(base_url: &str, reference: &str) -> Result<String> {
    let base = Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
    let resolved = base
        .join(reference)
        .with_context(|| format!("cannot resolve '{reference}' against {base_url}"))?;
    Ok(resolved.to_string())
}

pub(crate) fn select_all(node: &NodeRef, selector: &str) -> Result<Vec<NodeDataRef<ElementData>>> {
    Ok(node
        .select(selector)
        .map_err(|()| anyhow::anyhow!("invalid selector: {selector}"))?
        .collect())
}

fn serialize_document(document: &NodeRef) -> Result<String> {
    let mut out = Vec::new();
    document
        .serialize(&mut out)
        .context("failed to serialize document")?;
    String::from_utf8(out).context("serialized HTML is not valid UTF-8")
}

/// External references discovered in one document, keyed by the original
/// attribute value alongside the resolved absolute URL.
#[derive(Debug, Default)]
struct PageRefs {
    stylesheets: Vec<(String, String)>,
    images: Vec<(String, String)>,
    iframes: Vec<(String, String)>,
    pdf_anchors: Vec<(String, String)>,
}

/// Recursive inlining engine for one snapshot operation.
pub struct Inliner<'a> {
    renderer: &'a dyn PageRenderer,
    client: Client,
    config: &'a SnapshotConfig,
}

impl<'a> Inliner<'a> {
    #[must_use]
    pub fn new(renderer: &'a dyn PageRenderer, config: &'a SnapshotConfig) -> Self {
        Self {
            renderer,
            client: Client::new(),
            config,
        }
    }

    /// Inline every external reference reachable from `html`.
    ///
    /// `base_url` seeds the visited set, so a page embedding an iframe of
    /// itself terminates immediately.
    pub async fn inline(&self, html: String, base_url: &str) -> Result<String> {
        let mut visited = HashSet::new();
        visited.insert(base_url.to_string());
        self.inline_document(html, base_url.to_string(), visited, 0)
            .await
    }

    fn inline_document(
        &self,
        html: String,
        base_url: String,
        visited: HashSet<String>,
        depth: u8,
    ) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            // Phase 1: parse, prune, and collect references. The DOM is
            // dropped before any network await.
            let (pruned_html, refs) = prune_and_collect(html, &base_url, &self.config.banner_ids)?;

            // Phase 2a: stylesheets and images download concurrently.
            let css_downloads = refs.stylesheets.into_iter().map(|(href, css_url)| {
                let client = self.client.clone();
                let config = self.config;
                async move {
                    match downloaders::fetch_text(&client, &css_url, config).await {
                        Ok(text) => {
                            let inlined =
                                css::inline_css_resources(text, &css_url, &client, config).await;
                            Some((href, inlined))
                        }
                        Err(e) => {
                            warn!("failed to fetch stylesheet {css_url}: {e:#}");
                            None
                        }
                    }
                }
            });
            let image_downloads = refs.images.into_iter().map(|(src, image_url)| {
                let client = self.client.clone();
                let config = self.config;
                async move {
                    match downloaders::fetch_data_uri(&client, &image_url, config, "image/png")
                        .await
                    {
                        Ok(data_uri) => Some((src, data_uri)),
                        Err(e) => {
                            warn!("failed to fetch image {image_url}: {e:#}");
                            None
                        }
                    }
                }
            });
            let (css_results, image_results) =
                futures::join!(join_all(css_downloads), join_all(image_downloads));
            let css_map: HashMap<String, String> = css_results.into_iter().flatten().collect();
            let image_map: HashMap<String, String> = image_results.into_iter().flatten().collect();

            // Phase 2b: iframes recurse sequentially, guarded by the
            // visited set on the current recursion path and the depth cap.
            let mut iframe_map: HashMap<String, String> = HashMap::new();
            for (src, iframe_url) in refs.iframes {
                if visited.contains(&iframe_url) {
                    debug!("skipping cyclic iframe reference: {iframe_url}");
                    continue;
                }
                if depth >= self.config.max_frame_depth {
                    warn!("frame depth limit reached, leaving iframe in place: {iframe_url}");
                    continue;
                }
                let rendered = match self.renderer.render(&iframe_url).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("failed to render iframe {iframe_url}: {e}");
                        continue;
                    }
                };
                let mut branch_visited = visited.clone();
                branch_visited.insert(iframe_url.clone());
                match self
                    .inline_document(rendered.html, iframe_url.clone(), branch_visited, depth + 1)
                    .await
                {
                    Ok(inlined) => {
                        iframe_map.insert(src, inlined);
                    }
                    Err(e) => warn!("failed to inline iframe {iframe_url}: {e:#}"),
                }
            }

            // Phase 2c: linked PDF text.
            let mut pdf_map: HashMap<String, (String, String)> = HashMap::new();
            for (href, pdf_url) in refs.pdf_anchors {
                match pdf::extract_text_from_pdf(&self.client, &pdf_url, self.config).await {
                    Ok(text) => {
                        pdf_map.insert(href, (pdf_url, text));
                    }
                    Err(e) => warn!("failed to extract PDF text from {pdf_url}: {e:#}"),
                }
            }

            // Phase 3: apply everything in a single parse/serialize cycle.
            apply_replacements(pruned_html, &css_map, &image_map, &iframe_map, &pdf_map)
        })
    }
}

/// Parse the document, remove banners and scripts, strip scroll locks, and
/// collect every external reference for the fetch phase.
fn prune_and_collect(
    html: String,
    base_url: &str,
    banner_ids: &[String],
) -> Result<(String, PageRefs)> {
    let document = kuchiki::parse_html().one(html);

    remove_elements_by_id(&document, banner_ids);
    remove_script_elements(&document)?;
    strip_overflow_hidden(&document)?;

    let mut refs = PageRefs::default();
    let mut seen: HashSet<(u8, String)> = HashSet::new();

    for link in select_all(&document, "link[rel=\"stylesheet\"]")? {
        let href = link.attributes.borrow().get("href").map(ToString::to_string);
        if let Some(href) = href
            && seen.insert((0, href.clone()))
        {
            match resolve_url(base_url, &href) {
                Ok(resolved) => refs.stylesheets.push((href, resolved)),
                Err(e) => warn!("cannot resolve stylesheet href '{href}': {e:#}"),
            }
        }
    }

    for img in select_all(&document, "img[src]")? {
        let src = img.attributes.borrow().get("src").map(ToString::to_string);
        if let Some(src) = src {
            if src.starts_with("data:") {
                continue;
            }
            if seen.insert((1, src.clone())) {
                match resolve_url(base_url, &src) {
                    Ok(resolved) => refs.images.push((src, resolved)),
                    Err(e) => warn!("cannot resolve image src '{src}': {e:#}"),
                }
            }
        }
    }

    for iframe in select_all(&document, "iframe[src]")? {
        let src = iframe
            .attributes
            .borrow()
            .get("src")
            .map(ToString::to_string);
        if let Some(src) = src {
            if src.starts_with("data:") || src.starts_with("about:") || src.starts_with("javascript:")
            {
                continue;
            }
            if seen.insert((2, src.clone())) {
                match resolve_url(base_url, &src) {
                    Ok(resolved) => refs.iframes.push((src, resolved)),
                    Err(e) => warn!("cannot resolve iframe src '{src}': {e:#}"),
                }
            }
        }
    }

    for anchor in select_all(&document, "a[href]")? {
        let href = anchor
            .attributes
            .borrow()
            .get("href")
            .map(ToString::to_string);
        if let Some(href) = href
            && seen.insert((3, href.clone()))
            && let Ok(resolved) = resolve_url(base_url, &href)
            && let Ok(parsed) = Url::parse(&resolved)
            && parsed.path().to_ascii_lowercase().ends_with(".pdf")
        {
            refs.pdf_anchors.push((href, resolved));
        }
    }

    Ok((serialize_document(&document)?, refs))
}

/// Remove configured consent-banner containers by element id. An id that is
/// not usable as a selector is skipped, like any other per-resource failure.
fn remove_elements_by_id(document: &NodeRef, ids: &[String]) {
    for id in ids {
        match select_all(document, &format!("#{id}")) {
            Ok(elements) => {
                for element in elements {
                    debug!("removing banner element #{id}");
                    element.as_node().detach();
                }
            }
            Err(_) => warn!("skipping banner id unusable in a selector: {id}"),
        }
    }
}

/// Remove every script element. Scripts already executed during rendering;
/// this only prevents re-execution when the saved file is opened.
fn remove_script_elements(document: &NodeRef) -> Result<()> {
    for script in select_all(document, "script")? {
        script.as_node().detach();
    }
    Ok(())
}

/// Strip `overflow: hidden` declarations from body style attributes,
/// keeping all other declarations. The attribute is dropped entirely when
/// nothing remains.
fn strip_overflow_hidden(document: &NodeRef) -> Result<()> {
    for body in select_all(document, "body")? {
        let style_value = {
            let attrs = body.attributes.borrow();
            attrs.get("style").map(ToString::to_string)
        };
        if let Some(style) = style_value {
            let kept: Vec<&str> = style
                .split(';')
                .map(str::trim)
                .filter(|declaration| !declaration.is_empty())
                .filter(|declaration| !OVERFLOW_HIDDEN_RE.is_match(declaration))
                .collect();
            let mut attrs = body.attributes.borrow_mut();
            if kept.is_empty() {
                attrs.remove("style");
            } else {
                attrs.insert("style", kept.join("; "));
            }
        }
    }
    Ok(())
}

/// Re-parse the pruned document and apply all fetched replacements in one
/// pass, preserving element order.
fn apply_replacements(
    html: String,
    css_map: &HashMap<String, String>,
    image_map: &HashMap<String, String>,
    iframe_map: &HashMap<String, String>,
    pdf_map: &HashMap<String, (String, String)>,
) -> Result<String> {
    if css_map.is_empty() && image_map.is_empty() && iframe_map.is_empty() && pdf_map.is_empty() {
        return Ok(html);
    }

    let document = kuchiki::parse_html().one(html);

    // Replace stylesheet links with inline style blocks. Nodes are collected
    // up front because detach() during iteration invalidates the iterator.
    for link in select_all(&document, "link[rel=\"stylesheet\"]")? {
        let href = link.attributes.borrow().get("href").map(ToString::to_string);
        if let Some(href) = href
            && let Some(css_content) = css_map.get(&href)
        {
            let node = link.as_node();
            let style_html = format!("<style type=\"text/css\">\n{css_content}\n</style>");
            let fragment = kuchiki::parse_html().one(style_html);
            if let Ok(style) = fragment.select_first("style") {
                node.insert_before(style.as_node().clone());
                node.detach();
                debug!("replaced stylesheet link with inline style: {href}");
            }
        }
    }

    // Rewrite image sources to data URIs; failed fetches keep the original
    // reference untouched.
    for img in select_all(&document, "img[src]")? {
        let src = img.attributes.borrow().get("src").map(ToString::to_string);
        if let Some(src) = src
            && let Some(data_uri) = image_map.get(&src)
        {
            img.attributes.borrow_mut().insert("src", data_uri.clone());
            debug!("replaced image src with data URI: {src}");
        }
    }

    // Replace iframes with a container div holding the inlined subtree.
    for iframe in select_all(&document, "iframe[src]")? {
        let src = iframe
            .attributes
            .borrow()
            .get("src")
            .map(ToString::to_string);
        if let Some(src) = src
            && let Some(inlined) = iframe_map.get(&src)
        {
            let node = iframe.as_node();
            let wrapper_doc = kuchiki::parse_html().one(String::from("<div></div>"));
            if let Ok(wrapper) = wrapper_doc.select_first("div") {
                wrapper
                    .attributes
                    .borrow_mut()
                    .insert("data-inlined-iframe", src.clone());
                let wrapper_node = wrapper.as_node().clone();
                let frame_doc = kuchiki::parse_html().one(inlined.clone());
                // Head carries the inlined <style> blocks, body the content;
                // both move into the container.
                for section in ["head", "body"] {
                    if let Ok(root) = frame_doc.select_first(section) {
                        let children: Vec<NodeRef> = root.as_node().children().collect();
                        for child in children {
                            wrapper_node.append(child);
                        }
                    }
                }
                node.insert_before(wrapper_node);
                node.detach();
                debug!("replaced iframe with inlined content: {src}");
            }
        }
    }

    // Append extracted PDF text right after each matching anchor; the anchor
    // itself stays untouched.
    for anchor in select_all(&document, "a[href]")? {
        let href = anchor
            .attributes
            .borrow()
            .get("href")
            .map(ToString::to_string);
        if let Some(href) = href
            && let Some((pdf_url, text)) = pdf_map.get(&href)
        {
            let wrapper_doc = kuchiki::parse_html().one(String::from("<div></div>"));
            if let Ok(wrapper) = wrapper_doc.select_first("div") {
                wrapper
                    .attributes
                    .borrow_mut()
                    .insert("class", String::from("inlined-pdf-text"));
                let wrapper_node = wrapper.as_node().clone();
                wrapper_node.append(NodeRef::new_text(format!(
                    "PDF content from {pdf_url}:\n\n{text}"
                )));
                anchor.as_node().insert_after(wrapper_node);
                debug!("appended PDF text after anchor: {href}");
            }
        }
    }

    serialize_document(&document)
}
