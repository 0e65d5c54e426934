//! HTML 페이지의 `<table>` 추출.
//!
//! 페이지 전체의 테이블을 문서 순서대로 행/열 구조로 변환합니다.
//! - `colspan`/`rowspan`은 값을 복제해 격자로 펼침
//! - `thead` 행 또는 데이터 행 이전의 `th` 전용 행은 헤더로 취급
//! - 여러 줄 헤더는 열마다 서로 다른 텍스트를 공백으로 연결
//! - 빈 셀은 `None`, 모든 셀이 빈 행은 건너뜀

use crate::error::{DataError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::fmt;

/// 추출된 HTML 테이블.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    /// 열 이름 (중복 시 `.1`, `.2` 접미사)
    pub columns: Vec<String>,
    /// 데이터 행 (모든 행의 길이는 `columns.len()`과 같음)
    pub rows: Vec<Vec<Option<String>>>,
}

impl HtmlTable {
    /// 데이터 행 수
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// 열 수
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// 원격 헤더를 버리고 고정 열 이름을 적용
    ///
    /// 각 행은 새 열 수에 맞춰 잘리거나 `None`으로 채워집니다.
    pub fn relabel(mut self, names: &[&str]) -> Self {
        for row in &mut self.rows {
            row.resize(names.len(), None);
        }
        self.columns = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

/// 페이지 내 테이블 위치 (문서 순서상 n번째, 0부터).
///
/// 레이아웃이 바뀌면 이 값만 고치면 되도록 각 수집기는 위치를 상수로 둡니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocator(pub usize);

impl fmt::Display for TableLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table[{}]", self.0)
    }
}

/// CSS 셀렉터 파싱
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DataError::Parse(format!("invalid selector `{}`: {:?}", css, e)))
}

/// 문서의 모든 테이블을 순서대로 추출
pub fn extract_tables(document: &Html) -> Result<Vec<HtmlTable>> {
    let table_selector = selector("table")?;
    let tr_selector = selector("tr")?;

    Ok(document
        .select(&table_selector)
        .map(|table| parse_table(table, &tr_selector))
        .collect())
}

/// 위치 지정자로 테이블 하나를 선택
pub fn locate_table(document: &Html, locator: TableLocator) -> Result<HtmlTable> {
    let table_selector = selector("table")?;
    let tr_selector = selector("tr")?;

    match document.select(&table_selector).nth(locator.0) {
        Some(table) => Ok(parse_table(table, &tr_selector)),
        None => Err(DataError::TableNotFound {
            locator: locator.to_string(),
            found: document.select(&table_selector).count(),
        }),
    }
}

/// HTML 표준의 `colspan` 상한
const MAX_COLSPAN: usize = 1000;

/// HTML 표준의 `rowspan` 상한
const MAX_ROWSPAN: usize = 65534;

/// 격자에 펼쳐진 셀
#[derive(Debug, Clone)]
struct Cell {
    text: Option<String>,
}

fn parse_table(table: ElementRef<'_>, tr_selector: &Selector) -> HtmlTable {
    let mut header_rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut body_rows: Vec<Vec<Option<String>>> = Vec::new();
    // 열별 rowspan 이월: (남은 행 수, 셀)
    let mut pending: Vec<Option<(usize, Cell)>> = Vec::new();

    for tr in table
        .select(tr_selector)
        .filter(|tr| belongs_to(*tr, table))
    {
        let elements: Vec<ElementRef<'_>> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "th" | "td"))
            .collect();

        if elements.is_empty() && pending.iter().all(Option::is_none) {
            continue;
        }

        let grid = expand_row(&elements, &mut pending);

        let has_td = elements.iter().any(|el| el.value().name() == "td");
        let in_thead = tr
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|p| p.value().name() == "thead");
        let is_header = in_thead || (!has_td && !elements.is_empty() && body_rows.is_empty());

        let texts: Vec<Option<String>> = grid.into_iter().map(|c| c.text).collect();
        if is_header {
            header_rows.push(texts);
        } else if texts.iter().any(Option::is_some) {
            body_rows.push(texts);
        }
    }

    let width = header_rows
        .iter()
        .chain(body_rows.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    for row in &mut body_rows {
        row.resize(width, None);
    }

    HtmlTable {
        columns: header_names(&header_rows, width),
        rows: body_rows,
    }
}

/// 한 행의 셀을 colspan/rowspan에 맞춰 격자로 펼침
fn expand_row(elements: &[ElementRef<'_>], pending: &mut Vec<Option<(usize, Cell)>>) -> Vec<Cell> {
    let mut grid: Vec<Cell> = Vec::new();
    let mut cells = elements.iter();

    loop {
        let col = grid.len();
        if let Some(carried) = take_pending(pending, col) {
            grid.push(carried);
            continue;
        }

        let Some(el) = cells.next() else { break };
        let cell = Cell {
            text: cell_text(*el),
        };
        let colspan = span(*el, "colspan", MAX_COLSPAN);
        let rowspan = span(*el, "rowspan", MAX_ROWSPAN);

        for _ in 0..colspan {
            let col = grid.len();
            if rowspan > 1 {
                if pending.len() <= col {
                    pending.resize(col + 1, None);
                }
                pending[col] = Some((rowspan - 1, cell.clone()));
            }
            grid.push(cell.clone());
        }
    }

    // 셀이 끝난 뒤에도 위 행에서 이월된 열은 채움
    while grid.len() < pending.len() {
        let col = grid.len();
        let carried = take_pending(pending, col).unwrap_or(Cell { text: None });
        grid.push(carried);
    }

    while matches!(pending.last(), Some(None)) {
        pending.pop();
    }

    grid
}

fn take_pending(pending: &mut [Option<(usize, Cell)>], col: usize) -> Option<Cell> {
    let slot = pending.get_mut(col)?;
    let (remaining, cell) = slot.as_mut()?;
    let carried = cell.clone();
    *remaining -= 1;
    if *remaining == 0 {
        *slot = None;
    }
    Some(carried)
}

/// 헤더 행들로부터 열 이름 생성
fn header_names(header_rows: &[Vec<Option<String>>], width: usize) -> Vec<String> {
    let mut names: Vec<String> = (0..width)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::new();
            for row in header_rows {
                if let Some(Some(text)) = row.get(col) {
                    if parts.last() != Some(&text.as_str()) {
                        parts.push(text.as_str());
                    }
                }
            }
            if parts.is_empty() {
                col.to_string()
            } else {
                parts.join(" ")
            }
        })
        .collect();

    // 이미 있는 이름과 겹치지 않을 때까지 접미사를 올림
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in &mut names {
        let mut count = counts.get(name.as_str()).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            *name = format!("{}.{}", name, count);
            count = counts.get(name.as_str()).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), count + 1);
    }

    names
}

/// 행의 가장 가까운 상위 테이블이 `table`인지 (중첩 테이블 행 제외)
fn belongs_to(tr: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|el| el.id() == table.id())
}

/// 셀 텍스트 (공백 정리, 빈 문자열은 None)
fn cell_text(el: ElementRef<'_>) -> Option<String> {
    let raw = el.text().collect::<String>();
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `colspan`/`rowspan` 값 (없거나 0이면 1, 상한 초과 시 상한)
fn span(el: ElementRef<'_>, attr: &str, max: usize) -> usize {
    el.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(1, |n| n.min(max))
}
