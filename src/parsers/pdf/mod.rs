mod extractor;
mod font;
mod table;

pub use extractor::PdfDocument;
pub use font::FontDecoder;
pub use table::{Table, TextSpan};

pub mod prelude {
    pub use super::{PdfDocument, Table, TextSpan};
}
