use scraper::{ElementRef, Html, Selector};

use crate::types::{BodyRow, RawTable, RowKind};

/// Browsers cap `colspan` at this value.
const MAX_COLSPAN: usize = 1000;

/// Walks every `<table>` in document order, yielding those that have both a
/// `<thead>` and a `<tbody>`.
pub fn locate_tables(document: &Html) -> impl Iterator<Item = RawTable> + '_ {
    let table_selector = Selector::parse("table").unwrap();
    document
        .select(&table_selector)
        .collect::<Vec<_>>()
        .into_iter()
        .enumerate()
        .filter_map(|(index, table)| extract_table(table, index + 1))
}

fn extract_table(table: ElementRef<'_>, position: usize) -> Option<RawTable> {
    let thead = child_element(table, "thead")?;
    let tbody = child_element(table, "tbody")?;

    let identifier = table
        .value()
        .attr("id")
        .map(str::to_string)
        .unwrap_or_else(|| format!("table_{}", position));

    let header_rows = child_elements(thead, "tr").map(expand_row).collect();
    let body_rows = child_elements(tbody, "tr")
        .map(|tr| BodyRow {
            kind: RowKind::from_classes(tr.value().classes()),
            cells: expand_row(tr),
        })
        .collect();

    let caption_selector = Selector::parse("caption").unwrap();
    let caption = table
        .select(&caption_selector)
        .next()
        .map(element_text);

    Some(RawTable {
        identifier,
        header_rows,
        body_rows,
        caption,
    })
}

/// Repeats each cell's text once per spanned column.
pub fn expand_row(tr: ElementRef<'_>) -> Vec<String> {
    let mut row = Vec::new();
    for cell in tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "th" | "td"))
    {
        let span = colspan(cell);
        let text = element_text(cell);
        row.extend(std::iter::repeat(text).take(span));
    }
    row
}

pub fn colspan(cell: ElementRef<'_>) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .map_or(1, |n| n.min(MAX_COLSPAN))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn child_element<'a>(parent: ElementRef<'a>, name: &'static str) -> Option<ElementRef<'a>> {
    child_elements(parent, name).next()
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}
