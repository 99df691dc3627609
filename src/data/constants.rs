//! Localized labels, style names and unit conversions
//!
//! The thesis template is Vietnamese: section titles, figure/table
//! keywords and the visible placeholders all use the labels below.

// ============================================================================
// Markup keywords
// ============================================================================

/// Keyword that starts a table caption line ("Bảng 1.1: ...")
pub const TABLE_KEYWORD: &str = "Bảng";

/// Keyword used in figure placeholders ("[Hình 1.2: ...]")
pub const FIGURE_KEYWORD: &str = "Hình";

/// Literal bullet glyphs accepted as a level-1 bullet prefix
pub const BULLET_GLYPHS: &[char] = &['•', '●', '◦', '▪'];

/// Visible glyph per bullet level (1-3)
pub const BULLET_LEVEL_GLYPHS: [&str; 3] = ["-", "+", "-"];

// ============================================================================
// Front matter
// ============================================================================

pub const FIELD_REFRESH_NOTE: &str = "Lưu ý: Nhấn Ctrl+A rồi nhấn F9 (hoặc chuột phải chọn 'Update Field') để cập nhật Mục lục và Danh mục.";
pub const TOC_TITLE: &str = "MỤC LỤC";
pub const LIST_OF_FIGURES_TITLE: &str = "DANH MỤC HÌNH ẢNH";
pub const LIST_OF_TABLES_TITLE: &str = "DANH MỤC BẢNG BIỂU";
pub const ABBREVIATIONS_TITLE: &str = "DANH MỤC CÁC TỪ VIẾT TẮT VÀ KÝ HIỆU";
pub const REFERENCES_TITLE: &str = "TÀI LIỆU THAM KHẢO";

pub const ABBREVIATION_GROUP_LABEL: &str = "Viết tắt";
pub const SYMBOL_GROUP_LABEL: &str = "Ký hiệu";
pub const ABBREVIATION_HEADER: [&str; 2] = ["Ký hiệu / Viết tắt", "Diễn giải"];

/// Field codes of the computed lists
pub const TOC_FIELD: &str = r#"TOC \o "1-3" \h \z \u"#;
pub const LIST_OF_FIGURES_FIELD: &str = r#"TOC \h \z \t "Figure Caption,1""#;
pub const LIST_OF_TABLES_FIELD: &str = r#"TOC \h \z \t "Table Caption,1""#;

// ============================================================================
// Style identifiers
// ============================================================================

pub const STYLE_NORMAL: &str = "Normal";
pub const STYLE_FRONT_HEADING: &str = "FrontHeading";
pub const STYLE_FIGURE_CAPTION: &str = "FigureCaption";
pub const STYLE_TABLE_CAPTION: &str = "TableCaption";
pub const STYLE_TABLE_GRID: &str = "TableGrid";

/// Style id of a heading level (1-5)
pub fn heading_style_id(level: u8) -> String {
    format!("Heading{}", level.clamp(1, 5))
}

// ============================================================================
// Visible placeholders and result messages
// ============================================================================

pub fn figure_record_missing(number: &str) -> String {
    format!("[Hình ảnh không tìm thấy dữ liệu: {}]", number)
}

pub fn figure_file_missing(path: &str) -> String {
    format!("[Hình ảnh không tìm thấy: {}]", path)
}

pub fn figure_insert_failed(number: &str) -> String {
    format!("[Lỗi chèn hình: {}]", number)
}

pub fn export_succeeded(path: &str) -> String {
    format!("Đã xuất file Word:\n{}", path)
}

pub fn export_failed(cause: &str) -> String {
    format!("Không thể xuất file Word:\n{}", cause)
}

/// Gray used for equation placeholders
pub const PLACEHOLDER_COLOR: &str = "808080";
/// Red used for the field-refresh note
pub const NOTE_COLOR: &str = "FF0000";
pub const NOTE_FONT_SIZE_PT: f64 = 11.0;

// ============================================================================
// Units
// ============================================================================

/// Twentieths of a point per centimetre
pub const TWIPS_PER_CM: f64 = 566.929;
/// English Metric Units per centimetre
pub const EMU_PER_CM: f64 = 360_000.0;
/// English Metric Units per point
pub const EMU_PER_PT: f64 = 12_700.0;

/// Bullet geometry in centimetres
pub const BULLET_LEVEL_STEP_CM: f64 = 0.75;
pub const BULLET_HANGING_CM: f64 = 0.63;
/// Left indent of level-5 headings in centimetres
pub const H5_INDENT_CM: f64 = 0.63;

pub fn cm_to_twips(cm: f64) -> i64 {
    (cm * TWIPS_PER_CM).round() as i64
}

pub fn cm_to_emu(cm: f64) -> i64 {
    (cm * EMU_PER_CM).round() as i64
}

pub fn pt_to_emu(pt: f64) -> i64 {
    (pt * EMU_PER_PT).round() as i64
}

/// Font sizes are stored in half-points
pub fn pt_to_half_points(pt: f64) -> i64 {
    (pt * 2.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(cm_to_twips(1.27), 720);
        assert_eq!(cm_to_emu(16.0), 5_760_000);
        assert_eq!(pt_to_half_points(13.0), 26);
        assert_eq!(pt_to_half_points(10.5), 21);
    }

    #[test]
    fn test_messages() {
        assert_eq!(figure_record_missing("Hình 1.2"), "[Hình ảnh không tìm thấy dữ liệu: Hình 1.2]");
        assert!(export_succeeded("/tmp/a.docx").ends_with("/tmp/a.docx"));
        assert_eq!(heading_style_id(7), "Heading5");
    }
}
