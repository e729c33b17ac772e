//! Text assembly from positioned glyphs.
//!
//! Glyphs are grouped into lines by vertical position and into words by
//! horizontal gaps. Words of a line are joined with a single space and
//! lines with a newline.

use super::layout::Glyph;

/// Maximum horizontal gap between two glyphs of the same word.
pub const X_TOLERANCE: f32 = 3.0;
/// Maximum vertical offset between items of the same line.
pub const Y_TOLERANCE: f32 = 3.0;

/// A word assembled from adjacent glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Word {
    fn from_glyphs(glyphs: &[&Glyph]) -> Self {
        let text = glyphs.iter().map(|g| g.text.as_str()).collect();
        let x0 = glyphs.iter().map(|g| g.x0).fold(f32::INFINITY, f32::min);
        let x1 = glyphs.iter().map(|g| g.x1).fold(f32::NEG_INFINITY, f32::max);
        let top = glyphs.iter().map(|g| g.top).fold(f32::INFINITY, f32::min);
        let bottom = glyphs
            .iter()
            .map(|g| g.bottom)
            .fold(f32::NEG_INFINITY, f32::max);
        Self {
            text,
            x0,
            x1,
            top,
            bottom,
        }
    }
}

/// Group items whose `top` values chain within `tolerance`.
///
/// Clusters are ordered top to bottom; items keep their input order inside
/// a cluster.
pub fn cluster_by_top<T, F>(items: Vec<T>, tolerance: f32, top: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> f32,
{
    if items.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        top(&items[a])
            .partial_cmp(&top(&items[b]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Cluster index for each item.
    let mut assignment = vec![0usize; items.len()];
    let mut cluster = 0;
    let mut last = top(&items[order[0]]);
    for &idx in &order {
        let value = top(&items[idx]);
        if value > last + tolerance {
            cluster += 1;
        }
        assignment[idx] = cluster;
        last = value;
    }

    let mut clusters: Vec<Vec<T>> = (0..=cluster).map(|_| Vec::new()).collect();
    for (idx, item) in items.into_iter().enumerate() {
        clusters[assignment[idx]].push(item);
    }
    clusters
}

fn sort_by_x0<T, F: Fn(&T) -> f32>(items: &mut [T], x0: F) {
    items.sort_by(|a, b| {
        x0(a)
            .partial_cmp(&x0(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Split glyphs into words.
///
/// A word ends at a whitespace glyph, at a horizontal gap wider than
/// [`X_TOLERANCE`], or where the next glyph starts left of the previous one.
pub fn extract_words(glyphs: &[Glyph]) -> Vec<Word> {
    let refs: Vec<&Glyph> = glyphs.iter().collect();
    let mut words = Vec::new();

    for mut line in cluster_by_top(refs, Y_TOLERANCE, |g| g.top) {
        sort_by_x0(&mut line, |g| g.x0);

        let mut current: Vec<&Glyph> = Vec::new();
        for glyph in line {
            if glyph.is_whitespace() {
                if !current.is_empty() {
                    words.push(Word::from_glyphs(&current));
                    current.clear();
                }
                continue;
            }

            if let Some(prev) = current.last() {
                if glyph.x0 > prev.x1 + X_TOLERANCE || glyph.x0 < prev.x0 {
                    words.push(Word::from_glyphs(&current));
                    current.clear();
                }
            }
            current.push(glyph);
        }
        if !current.is_empty() {
            words.push(Word::from_glyphs(&current));
        }
    }

    words
}

/// Assemble the text of a set of glyphs.
///
/// Returns `None` when no visible character is present.
pub fn extract_text(glyphs: &[Glyph]) -> Option<String> {
    let words = extract_words(glyphs);
    if words.is_empty() {
        return None;
    }

    let lines: Vec<String> = cluster_by_top(words, Y_TOLERANCE, |w| w.top)
        .into_iter()
        .map(|mut line| {
            sort_by_x0(&mut line, |w| w.x0);
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    Some(lines.join("\n"))
}
