//! Shared fixture builders for integration tests.
//!
//! Every fixture is built in memory with lopdf: pages carry a Helvetica
//! `/F1` font, text drawn with [`FormBuilder::text`], and widgets added
//! through the field helpers.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Field flag bits used by the fixtures.
pub const COMBO: i64 = 1 << 17;
pub const COMB: i64 = 1 << 24;
pub const RADIO: i64 = 1 << 15;
pub const PUSHBUTTON: i64 = 1 << 16;
pub const NO_TOGGLE_TO_OFF: i64 = 1 << 14;

struct PageContent {
    id: ObjectId,
    content: String,
    annots: Vec<Object>,
}

pub struct FormBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    pages: Vec<PageContent>,
    fields: Vec<Object>,
}

pub fn rect(r: [f64; 4]) -> Object {
    Object::Array(r.iter().map(|&v| Object::Real(v as f32)).collect())
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

impl FormBuilder {
    pub fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let pages = (0..page_count)
            .map(|_| PageContent {
                id: doc.new_object_id(),
                content: String::new(),
                annots: Vec::new(),
            })
            .collect();
        Self {
            doc,
            pages_id,
            font_id,
            pages,
            fields: Vec::new(),
        }
    }

    fn page_id(&self, page: usize) -> ObjectId {
        self.pages[page - 1].id
    }

    /// Draw `text` at 10pt with its origin at `(x, y)` on `page` (1-based).
    pub fn text(&mut self, page: usize, x: f64, y: f64, text: &str) -> &mut Self {
        let ops = format!("BT /F1 10 Tf {x} {y} Td ({}) Tj ET\n", escape(text));
        self.pages[page - 1].content.push_str(&ops);
        self
    }

    /// A terminal field whose single widget is merged into `dict`.
    pub fn field(&mut self, page: usize, mut dict: Dictionary, r: [f64; 4]) -> ObjectId {
        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        dict.set("Rect", rect(r));
        dict.set("P", self.page_id(page));
        let id = self.doc.add_object(dict);
        self.fields.push(id.into());
        self.pages[page - 1].annots.push(id.into());
        id
    }

    pub fn text_field(&mut self, page: usize, name: &str, r: [f64; 4]) -> ObjectId {
        self.field(
            page,
            dictionary! { "FT" => "Tx", "T" => Object::string_literal(name) },
            r,
        )
    }

    /// A field whose widgets are separate kids, one per entry of `kids`.
    ///
    /// Each kid dictionary gets the widget entries and its `/Rect`.
    pub fn field_with_kids(
        &mut self,
        page: usize,
        mut dict: Dictionary,
        kids: Vec<(Dictionary, [f64; 4])>,
    ) -> ObjectId {
        let parent = self.doc.new_object_id();
        let page_id = self.page_id(page);
        let mut refs = Vec::new();
        for (mut kid, r) in kids {
            kid.set("Type", "Annot");
            kid.set("Subtype", "Widget");
            kid.set("Parent", parent);
            kid.set("Rect", rect(r));
            kid.set("P", page_id);
            let id = self.doc.add_object(kid);
            self.pages[page - 1].annots.push(id.into());
            refs.push(Object::from(id));
        }
        dict.set("Kids", refs);
        self.doc.objects.insert(parent, Object::Dictionary(dict));
        self.fields.push(parent.into());
        parent
    }

    /// A widget annotation no field in `/Fields` points at.
    pub fn loose_widget(&mut self, page: usize, mut dict: Dictionary, r: [f64; 4]) -> ObjectId {
        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        dict.set("Rect", rect(r));
        let id = self.doc.add_object(dict);
        self.pages[page - 1].annots.push(id.into());
        id
    }

    /// A 12x12 form XObject usable as a widget appearance.
    pub fn appearance(&mut self, ops: &str) -> ObjectId {
        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
            },
            ops.as_bytes().to_vec(),
        ))
    }

    pub fn build(self) -> Vec<u8> {
        let Self {
            mut doc,
            pages_id,
            font_id,
            pages,
            fields,
        } = self;

        let mut kids = Vec::new();
        for page in pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.into_bytes()));
            let mut dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            };
            if !page.annots.is_empty() {
                dict.set("Annots", page.annots);
            }
            doc.objects.insert(page.id, Object::Dictionary(dict));
            kids.push(Object::from(page.id));
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
        if !fields.is_empty() {
            catalog.set("AcroForm", dictionary! { "Fields" => fields });
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}

/// One text field `applicant_name` with `Name:` printed 100 units to its left.
pub fn applicant_form() -> Vec<u8> {
    let mut form = FormBuilder::new(1);
    form.text(1, 100.0, 700.0, "Name:");
    form.text_field(1, "applicant_name", [200.0, 696.0, 400.0, 712.0]);
    form.build()
}

/// Left edge of IBAN digit box `i`.
pub fn iban_box_x(i: usize) -> f64 {
    100.0 + i as f64 * 18.0
}

/// One structural `iban` field split into 22 digit boxes on one line.
pub fn iban_form() -> Vec<u8> {
    let mut form = FormBuilder::new(1);
    form.text(1, 40.0, 600.0, "IBAN");
    let kids = (0..22)
        .map(|i| {
            let x = iban_box_x(i);
            (Dictionary::new(), [x, 596.0, x + 14.0, 612.0])
        })
        .collect();
    form.field_with_kids(
        1,
        dictionary! { "FT" => "Tx", "T" => Object::string_literal("iban") },
        kids,
    );
    form.build()
}

/// Two pages exercising every field kind.
///
/// Page 1: `full_name` (tooltip), `agree` checkbox with a styled
/// appearance, `zip` comb field of 2 cells, `country` dropdown and
/// `color` radio group. Page 2: `notes` holding "keep me".
pub fn mixed_form() -> Vec<u8> {
    let mut form = FormBuilder::new(2);
    form.text(1, 72.0, 740.0, "Application");
    form.text(1, 72.0, 700.0, "Full name:");
    form.field(
        1,
        dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("full_name"),
            "TU" => Object::string_literal("Applicant full name"),
        },
        [160.0, 696.0, 400.0, 712.0],
    );

    let on = form.appearance("q 0 0 1 rg 2 2 8 8 re f Q");
    let off = form.appearance("");
    form.text(1, 72.0, 660.0, "I agree");
    form.field(
        1,
        dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("agree"),
            "V" => "Off",
            "AS" => "Off",
            "AP" => dictionary! { "N" => dictionary! { "Ja" => on, "Off" => off } },
            "MK" => dictionary! { "CA" => Object::string_literal("4") },
        },
        [160.0, 656.0, 172.0, 668.0],
    );

    form.text(1, 72.0, 620.0, "ZIP:");
    form.field(
        1,
        dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("zip"),
            "Ff" => COMB,
            "MaxLen" => 2,
        },
        [160.0, 616.0, 200.0, 632.0],
    );

    form.text(1, 72.0, 580.0, "Country:");
    form.field(
        1,
        dictionary! {
            "FT" => "Ch",
            "T" => Object::string_literal("country"),
            "Ff" => COMBO,
            "Opt" => vec![
                Object::Array(vec![Object::string_literal("DE"), Object::string_literal("Germany")]),
                Object::Array(vec![Object::string_literal("FR"), Object::string_literal("France")]),
            ],
        },
        [160.0, 576.0, 300.0, 592.0],
    );

    let red = form.appearance("q 1 0 0 rg 2 2 8 8 re f Q");
    let blue = form.appearance("q 0 0 1 rg 2 2 8 8 re f Q");
    let off_red = form.appearance("");
    let off_blue = form.appearance("");
    form.field_with_kids(
        1,
        dictionary! {
            "FT" => "Btn",
            "T" => Object::string_literal("color"),
            "Ff" => RADIO | NO_TOGGLE_TO_OFF,
            "V" => "Off",
        },
        vec![
            (
                dictionary! { "AS" => "Off", "AP" => dictionary! { "N" => dictionary! { "red" => red, "Off" => off_red } } },
                [160.0, 536.0, 172.0, 548.0],
            ),
            (
                dictionary! { "AS" => "Off", "AP" => dictionary! { "N" => dictionary! { "blue" => blue, "Off" => off_blue } } },
                [200.0, 536.0, 212.0, 548.0],
            ),
        ],
    );

    form.text(2, 72.0, 700.0, "Notes:");
    form.field(
        2,
        dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("notes"),
            "V" => Object::string_literal("keep me"),
        },
        [160.0, 696.0, 500.0, 712.0],
    );
    form.build()
}
