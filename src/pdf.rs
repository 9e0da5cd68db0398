// 📄 PDF Writer - minimal in-memory document renderer
//
// Renders pages of text, lines, filled rectangles and pie wedges straight
// into a Vec<u8>. No filesystem access and no platform dependencies: the
// report pipeline builds the whole document in memory and hands the finished
// bytes to the delivery boundary.
//
// Scope is deliberately small: the two built-in Helvetica fonts with
// WinAnsi encoding (covers the Spanish labels) and the handful of path
// operators the livestock report needs.

/// A4 page size in points
pub const A4_WIDTH: f64 = 595.28;
pub const A4_HEIGHT: f64 = 841.89;

/// RGB color, 0-255 per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// "r g b" with channels scaled to 0..1, as PDF color operators expect
    fn operands(&self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            f64::from(self.0) / 255.0,
            f64::from(self.1) / 255.0,
            f64::from(self.2) / 255.0
        )
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb(r, g, b)
    }
}

/// The two embedded base fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "/F1",
            Font::Bold => "/F2",
        }
    }
}

/// One PDF document under construction.
///
/// Coordinates follow the PDF convention: origin at the bottom-left corner,
/// y growing upward. Page content accumulates in uncompressed content
/// streams; `finish` consumes the builder and assembles the final file.
pub struct PdfDocument {
    width: f64,
    height: f64,
    pages: Vec<Vec<u8>>,
}

impl PdfDocument {
    /// Create a document with a first empty page
    pub fn new(width: f64, height: f64) -> Self {
        PdfDocument {
            width,
            height,
            pages: vec![Vec::new()],
        }
    }

    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_height(&self) -> f64 {
        self.height
    }

    /// Start a new page; subsequent drawing lands there
    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn push_op(&mut self, op: String) {
        let page = self.pages.last_mut().expect("document always has a page");
        page.extend_from_slice(op.as_bytes());
    }

    /// Draw a text run with its baseline at (x, y)
    pub fn text(&mut self, x: f64, y: f64, size: f64, font: Font, color: Rgb, s: &str) {
        let mut bytes = format!(
            "{} rg BT {} {:.2} Tf 1 0 0 1 {:.2} {:.2} Tm (",
            color.operands(),
            font.resource(),
            size,
            x,
            y
        )
        .into_bytes();
        encode_text(s, &mut bytes);
        bytes.extend_from_slice(b") Tj ET\n");

        let page = self.pages.last_mut().expect("document always has a page");
        page.extend_from_slice(&bytes);
    }

    /// Straight stroked line
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Rgb) {
        self.push_op(format!(
            "{} RG {:.2} w {:.2} {:.2} m {:.2} {:.2} l S\n",
            color.operands(),
            width,
            x1,
            y1,
            x2,
            y2
        ));
    }

    /// Axis-aligned filled rectangle; (x, y) is the bottom-left corner
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        self.push_op(format!(
            "{} rg {:.2} {:.2} {:.2} {:.2} re f\n",
            color.operands(),
            x,
            y,
            w,
            h
        ));
    }

    /// Filled pie wedge centered at (cx, cy). Angles in degrees, measured
    /// counterclockwise from the positive x axis; negative sweep draws
    /// clockwise. A zero sweep draws nothing.
    pub fn fill_wedge(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start_deg: f64,
        sweep_deg: f64,
        color: Rgb,
    ) {
        if sweep_deg == 0.0 {
            return;
        }

        let start = start_deg.to_radians();
        let sweep = sweep_deg.to_radians();

        let mut op = format!("{} rg {:.2} {:.2} m ", color.operands(), cx, cy);
        op.push_str(&format!(
            "{:.2} {:.2} l ",
            cx + radius * start.cos(),
            cy + radius * start.sin()
        ));

        // Approximate the arc with Bezier segments of at most a quarter turn
        let segments = (sweep.abs() / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as f64;
        let mut a0 = start;
        for _ in 0..segments {
            let a1 = a0 + step;
            let k = 4.0 / 3.0 * (step / 4.0).tan();

            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();

            let p1x = cx + radius * (c0 - k * s0);
            let p1y = cy + radius * (s0 + k * c0);
            let p2x = cx + radius * (c1 + k * s1);
            let p2y = cy + radius * (s1 - k * c1);
            let p3x = cx + radius * c1;
            let p3y = cy + radius * s1;

            op.push_str(&format!(
                "{p1x:.2} {p1y:.2} {p2x:.2} {p2y:.2} {p3x:.2} {p3y:.2} c "
            ));
            a0 = a1;
        }

        op.push_str("h f\n");
        self.push_op(op);
    }

    /// Assemble the final PDF file
    pub fn finish(self) -> Vec<u8> {
        let page_count = self.pages.len();
        let object_count = 4 + 2 * page_count;

        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xC7\xEC\x8F\xA2\n");

        let mut offsets: Vec<usize> = Vec::with_capacity(object_count);
        let begin_obj = |buf: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize| {
            offsets.push(buf.len());
            buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        };

        // 1: catalog
        begin_obj(&mut buf, &mut offsets, 1);
        buf.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        // 2: page tree
        begin_obj(&mut buf, &mut offsets, 2);
        let kids: Vec<String> = (0..page_count)
            .map(|i| format!("{} 0 R", 5 + page_count + i))
            .collect();
        buf.extend_from_slice(
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
                kids.join(" "),
                page_count
            )
            .as_bytes(),
        );

        // 3-4: fonts
        begin_obj(&mut buf, &mut offsets, 3);
        buf.extend_from_slice(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n",
        );
        begin_obj(&mut buf, &mut offsets, 4);
        buf.extend_from_slice(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        // 5..: content streams
        for (i, content) in self.pages.iter().enumerate() {
            begin_obj(&mut buf, &mut offsets, 5 + i);
            buf.extend_from_slice(format!("<< /Length {} >>\nstream\n", content.len()).as_bytes());
            buf.extend_from_slice(content);
            buf.extend_from_slice(b"\nendstream\nendobj\n");
        }

        // 5+n..: page objects
        for i in 0..page_count {
            begin_obj(&mut buf, &mut offsets, 5 + page_count + i);
            buf.extend_from_slice(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>\nendobj\n",
                    self.width,
                    self.height,
                    5 + i
                )
                .as_bytes(),
            );
        }

        // Cross-reference table and trailer
        let xref_offset = buf.len();
        buf.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            buf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                object_count + 1,
                xref_offset
            )
            .as_bytes(),
        );

        buf
    }
}

/// Append `s` to `out` as a WinAnsi-encoded PDF string body, escaping the
/// string delimiters. Characters outside the 8-bit range degrade to '?'.
fn encode_text(s: &str, out: &mut Vec<u8>) {
    for c in s.chars() {
        match c {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_well_formed() {
        let bytes = PdfDocument::a4().finish();

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn test_pages_appear_in_page_tree() {
        let mut doc = PdfDocument::a4();
        doc.add_page();
        doc.add_page();
        assert_eq!(doc.page_count(), 3);

        let bytes = doc.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 3"));
        assert_eq!(text.matches("/Type /Page ").count(), 3);
    }

    #[test]
    fn test_text_is_escaped_and_encoded() {
        let mut doc = PdfDocument::a4();
        doc.text(40.0, 800.0, 12.0, Font::Regular, Rgb::BLACK, "a(b)c\\d");
        doc.text(40.0, 780.0, 12.0, Font::Bold, Rgb::BLACK, "Categoría");

        let bytes = doc.finish();
        let text = bytes
            .windows(12)
            .any(|w| w == b"(a\\(b\\)c\\\\d)");
        assert!(text, "delimiters must be escaped");

        // 'í' encodes to the single WinAnsi byte 0xED
        assert!(bytes.windows(2).any(|w| w == [0xEDu8, b'a']));
    }

    #[test]
    fn test_wedge_emits_fill_path() {
        let mut doc = PdfDocument::a4();
        doc.fill_wedge(300.0, 400.0, 80.0, 90.0, -120.0, Rgb(0x84, 0xcc, 0x16));
        doc.fill_wedge(300.0, 400.0, 80.0, -30.0, 0.0, Rgb::BLACK); // no-op

        let bytes = doc.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches("h f").count(), 1);
        assert!(text.contains(" c "), "arc must use Bezier segments");
    }

    #[test]
    fn test_xref_has_entry_per_object() {
        let mut doc = PdfDocument::a4();
        doc.add_page();
        let bytes = doc.finish();
        let text = String::from_utf8_lossy(&bytes);

        // 4 fixed objects + 2 content streams + 2 pages, plus the free entry
        assert!(text.contains("xref\n0 9\n"));
        assert_eq!(text.matches(" 00000 n \n").count(), 8);
    }
}
