//! Top-level form document type.

use std::cell::{OnceCell, RefCell};

use acroform_core::{
    DetectOptions, ExtractResult, ExtractWarning, FieldDescriptor, FieldPosition, FormError,
    MetadataSource, TextRun, TranscriptOptions, WarningCode, find_nearby_text, reconcile_widgets,
    resolve_label,
};
use acroform_parse::{FormDocument, StructuralField, WidgetIndex, extract_widgets, read_fields};
use tracing::{debug, info, warn};

use crate::page_text::PageTexts;

/// A parsed form document.
///
/// Parsing happens once in [`FormPdf::open`]; detection, text runs and
/// transcripts all read the same in-memory document.
///
/// # Example
///
/// ```ignore
/// let pdf = FormPdf::open(&bytes, None)?;
/// let fields = pdf.detect_fields().value;
/// for page in pdf.page_texts(&fields, TranscriptOptions::default()) {
///     println!("{}", page.text);
/// }
/// ```
#[derive(Debug)]
pub struct FormPdf {
    doc: FormDocument,
    options: DetectOptions,
}

impl FormPdf {
    /// Open a form document from a file path.
    ///
    /// Requires the `std` feature (enabled by default).
    #[cfg(feature = "std")]
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<DetectOptions>,
    ) -> Result<Self, FormError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| FormError::Io(e.to_string()))?;
        Self::open(&bytes, options)
    }

    /// Open a form document from bytes.
    ///
    /// Fails with [`FormError::DocumentParse`] when the bytes are not a PDF
    /// and [`FormError::PasswordRequired`] when the document is encrypted.
    pub fn open(bytes: &[u8], options: Option<DetectOptions>) -> Result<Self, FormError> {
        let doc = FormDocument::open(bytes)?;
        Ok(Self {
            doc,
            options: options.unwrap_or_default(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    /// The underlying lopdf-backed document.
    pub fn document(&self) -> &FormDocument {
        &self.doc
    }

    /// Every widget annotation, in page then `/Annots` order.
    pub fn widgets(&self) -> ExtractResult<WidgetIndex> {
        extract_widgets(&self.doc, &self.options)
    }

    /// The terminal fields of the form's field tree.
    pub fn structural_fields(&self) -> ExtractResult<Vec<StructuralField>> {
        read_fields(&self.doc, &self.options)
    }

    /// Positioned text runs of one page (1-based).
    pub fn page_text_runs(&self, page: u32) -> Result<Vec<TextRun>, FormError> {
        Ok(acroform_parse::page_text_runs(
            &self.doc,
            page,
            &self.options,
        )?)
    }

    /// Detect every fillable field, labelled and in reading order.
    ///
    /// Structural fields are labelled from their tooltip, alternate name or
    /// the nearest text on the page. Widgets the field tree folds into one
    /// name come back as their own synthesized descriptors.
    pub fn detect_fields(&self) -> ExtractResult<Vec<FieldDescriptor>> {
        let options = &self.options;
        let ExtractResult {
            value: widgets,
            mut warnings,
        } = self.widgets();
        let structural = self.structural_fields();
        warnings.extend(structural.warnings);

        let runs = PageRuns::new(&self.doc, options);
        let descriptors: Vec<FieldDescriptor> = structural
            .value
            .iter()
            .map(|field| {
                let page = field.position.as_ref().map(|p| p.page);
                let rect = field.position.as_ref().map(FieldPosition::bbox);
                let label = resolve_label(
                    &field.name,
                    &field.metadata,
                    rect.as_ref(),
                    || page.and_then(|p| runs.get(p)),
                    options,
                );
                field.descriptor(label)
            })
            .collect();
        let structural_count = descriptors.len();

        let mut fields = reconcile_widgets(descriptors, &widgets.widgets, options);
        for field in fields.iter_mut().filter(|f| f.is_synthesized_widget) {
            let Some(position) = &field.position else {
                continue;
            };
            let nearby = runs
                .get(position.page)
                .and_then(|page_runs| find_nearby_text(&position.bbox(), page_runs, options));
            if let Some(label) = nearby {
                field.label = label;
                field.metadata_source = MetadataSource::NearbyText;
            }
        }

        warnings.extend(runs.into_warnings());
        for warning in &warnings {
            warn!(code = %warning.code, "{warning}");
        }
        info!(
            fields = fields.len(),
            synthesized = fields.len() - structural_count,
            warnings = warnings.len(),
            "fields detected"
        );
        ExtractResult::with_warnings(fields, warnings)
    }

    /// Per-page transcripts with field markers, decoded one page per step.
    ///
    /// The iterator holds no state across calls; each call starts fresh.
    pub fn page_texts<'a>(
        &'a self,
        fields: &'a [FieldDescriptor],
        options: TranscriptOptions,
    ) -> PageTexts<'a> {
        PageTexts::new(self, fields, options)
    }
}

/// Text runs decoded on first use, one slot per page.
///
/// A page whose content cannot be decoded yields no runs and one
/// [`WarningCode::LabelSearch`] warning.
struct PageRuns<'a> {
    doc: &'a FormDocument,
    options: &'a DetectOptions,
    pages: Vec<OnceCell<Option<Vec<TextRun>>>>,
    failures: RefCell<Vec<ExtractWarning>>,
}

impl<'a> PageRuns<'a> {
    fn new(doc: &'a FormDocument, options: &'a DetectOptions) -> Self {
        Self {
            doc,
            options,
            pages: (0..doc.page_count()).map(|_| OnceCell::new()).collect(),
            failures: RefCell::new(Vec::new()),
        }
    }

    fn get(&self, page: u32) -> Option<&[TextRun]> {
        let slot = self.pages.get(usize::try_from(page).ok()?.checked_sub(1)?)?;
        slot.get_or_init(
            || match acroform_parse::page_text_runs(self.doc, page, self.options) {
                Ok(runs) => Some(runs),
                Err(e) => {
                    debug!(page, error = %e, "page text unavailable for label search");
                    self.failures.borrow_mut().push(
                        ExtractWarning::new(WarningCode::LabelSearch, e.to_string()).on_page(page),
                    );
                    None
                }
            },
        )
        .as_deref()
    }

    fn into_warnings(self) -> Vec<ExtractWarning> {
        self.failures.into_inner()
    }
}
