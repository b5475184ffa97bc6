use crate::error::{CollectError, Result};
use crate::source::TableRow;
use scraper::{ElementRef, Html, Selector};

/// Cells a results row must have: license, name, profession, city, status.
pub const RESULT_COLUMNS: usize = 5;

/// Parses the contents of the provider results table.
pub struct TableParser {
    row: Selector,
    cell: Selector,
}

impl TableParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: selector("tr")?,
            cell: selector("td")?,
        })
    }

    /// Parse the inner HTML of a `<table>` element.
    ///
    /// Header rows without `td` cells are ignored. Every other row yields
    /// either a [`TableRow`] or `CollectError::InvalidRecord`, in document
    /// order, so the caller can skip bad rows and keep the rest.
    pub fn parse(&self, table_inner_html: &str) -> Vec<Result<TableRow>> {
        // Rows outside a table context are dropped by the HTML parser.
        let document = Html::parse_fragment(&format!("<table>{table_inner_html}</table>"));

        document
            .select(&self.row)
            .filter_map(|row| {
                let cells: Vec<String> = row.select(&self.cell).map(cell_text).collect();
                if cells.is_empty() {
                    None
                } else {
                    Some(row_from_cells(cells))
                }
            })
            .collect()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CollectError::Parse {
        context: format!("invalid selector '{css}': {e}"),
        partial: Vec::new(),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn row_from_cells(cells: Vec<String>) -> Result<TableRow> {
    if cells.len() < RESULT_COLUMNS {
        return Err(CollectError::InvalidRecord(format!(
            "results row has {} cells, expected {}",
            cells.len(),
            RESULT_COLUMNS
        )));
    }

    let mut cells = cells.into_iter();
    let mut next = || cells.next().unwrap_or_default();
    let row = TableRow {
        license_number: next(),
        full_name: next(),
        profession: next(),
        city: next(),
        status: next(),
    };

    if row.license_number.is_empty() || row.full_name.is_empty() {
        return Err(CollectError::InvalidRecord(format!(
            "results row missing license number or name: {row:?}"
        )));
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        <thead>
            <tr><th>License</th><th>Name</th><th>Profession</th><th>City</th><th>Status</th></tr>
        </thead>
        <tbody>
            <tr>
                <td><a href="/MQASearchServices/HealthCareProviders/Details?LicInd=1">ME85753</a></td>
                <td>ABDEL-HALIM,
                    JAMAL MOHAMMAD</td>
                <td>Medical Doctor</td>
                <td>WELLINGTON</td>
                <td>CLEAR/Active</td>
            </tr>
            <tr>
                <td>ME12345</td><td>DOE, JANE</td><td>Medical Doctor</td><td>MIAMI</td><td>NULL AND VOID/Inactive</td>
            </tr>
        </tbody>
    "#;

    #[test]
    fn test_parse_rows_in_order() {
        let parser = TableParser::new().unwrap();
        let rows: Vec<TableRow> = parser
            .parse(TABLE)
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].license_number, "ME85753");
        assert_eq!(rows[0].full_name, "ABDEL-HALIM, JAMAL MOHAMMAD");
        assert_eq!(rows[0].profession, "Medical Doctor");
        assert_eq!(rows[0].city, "WELLINGTON");
        assert_eq!(rows[0].status, "CLEAR/Active");
        assert_eq!(rows[1].license_number, "ME12345");
        assert_eq!(rows[1].status, "NULL AND VOID/Inactive");
    }

    #[test]
    fn test_bare_rows_without_tbody() {
        let parser = TableParser::new().unwrap();
        let html = "<tr><td>RN1</td><td>SMITH, ANN</td><td>RN</td><td>TAMPA</td><td>CLEAR/Active</td></tr>";
        let rows = parser.parse(html);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_ok());
    }

    #[test]
    fn test_short_row_is_invalid_but_others_survive() {
        let parser = TableParser::new().unwrap();
        let html = r"
            <tr><td>RN1</td><td>SMITH, ANN</td><td>RN</td><td>TAMPA</td><td>CLEAR/Active</td></tr>
            <tr><td colspan='5'>No further results</td></tr>
            <tr><td>RN2</td><td>JONES, BOB</td><td>RN</td><td>OCALA</td><td>Expired</td></tr>
        ";
        let rows = parser.parse(html);

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(CollectError::InvalidRecord(_))));
        assert_eq!(rows[2].as_ref().unwrap().license_number, "RN2");
    }

    #[test]
    fn test_row_without_name_is_invalid() {
        let parser = TableParser::new().unwrap();
        let html = "<tr><td>RN1</td><td> </td><td>RN</td><td>TAMPA</td><td>CLEAR/Active</td></tr>";
        let rows = parser.parse(html);
        assert!(matches!(rows[0], Err(CollectError::InvalidRecord(_))));
    }

    #[test]
    fn test_empty_table() {
        let parser = TableParser::new().unwrap();
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("<thead><tr><th>License</th></tr></thead>").is_empty());
    }
}
