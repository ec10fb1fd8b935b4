use std::collections::BTreeSet;

/// A set of 1-based page numbers picked with `--pages`.
///
/// Field positions and transcripts number pages from 1, so the selection
/// does too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    /// Every page of a document with `page_count` pages.
    pub fn all(page_count: usize) -> Self {
        Self {
            pages: (1..=page_count as u32).collect(),
        }
    }

    /// Parse a list like `1,3-5,8-`. An open range runs to the last page.
    pub fn parse(input: &str, page_count: usize) -> Result<Self, String> {
        let last = page_count as u32;
        let mut pages = BTreeSet::new();

        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page(start, last)?;
                    let end = if end.trim().is_empty() {
                        last
                    } else {
                        parse_page(end, last)?
                    };
                    if start > end {
                        return Err(format!("range '{part}' runs backwards"));
                    }
                    (start, end)
                }
                None => {
                    let page = parse_page(part, last)?;
                    (page, page)
                }
            };
            pages.extend(start..=end);
        }

        if pages.is_empty() {
            return Err(format!("no pages selected by '{input}'"));
        }
        Ok(Self { pages })
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn parse_page(text: &str, last: u32) -> Result<u32, String> {
    let text = text.trim();
    let page: u32 = text
        .parse()
        .map_err(|_| format!("invalid page number: '{text}'"))?;
    if page == 0 {
        return Err("page 0 is invalid (pages start at 1)".to_string());
    }
    if page > last {
        return Err(format!("page {page} exceeds document page count ({last})"));
    }
    Ok(page)
}
