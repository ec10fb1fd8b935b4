//! Lazy per-page transcripts.

use acroform_core::{
    FieldDescriptor, PageText, TranscriptOptions, build_page_text, unplaced_fields_line,
};
use tracing::warn;

use crate::FormPdf;

/// Iterator over page transcripts, decoding one page per step.
///
/// Pages whose text cannot be decoded still yield a transcript holding
/// that page's field markers. Fields with no position are listed at the
/// end of the last page.
pub struct PageTexts<'a> {
    pdf: &'a FormPdf,
    fields: &'a [FieldDescriptor],
    options: TranscriptOptions,
    current: usize,
    count: usize,
}

impl<'a> PageTexts<'a> {
    pub(crate) fn new(
        pdf: &'a FormPdf,
        fields: &'a [FieldDescriptor],
        options: TranscriptOptions,
    ) -> Self {
        Self {
            pdf,
            fields,
            options,
            current: 0,
            count: pdf.page_count(),
        }
    }
}

impl Iterator for PageTexts<'_> {
    type Item = PageText;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        self.current += 1;
        let page = u32::try_from(self.current).unwrap_or(u32::MAX);

        let runs = self.pdf.page_text_runs(page).unwrap_or_else(|e| {
            warn!(page, error = %e, "page text unavailable, transcript holds markers only");
            Vec::new()
        });
        let mut text = build_page_text(page, &runs, self.fields, &self.options);

        if self.current == self.count {
            if let Some(line) = unplaced_fields_line(self.fields) {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&line);
            }
        }
        Some(PageText { page, text })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PageTexts<'_> {}
