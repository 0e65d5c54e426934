//! 수집 결과 테이블(`DataFrame`) 유틸리티.
//!
//! 원격 데이터는 천 단위 구분 기호 등이 섞여 있으므로 모든 열을 문자열로 유지합니다.
//! 스키마는 원격 헤더가 결정하며 이 모듈은 강제하지 않습니다.

use crate::error::Result;
use crate::html::HtmlTable;
use polars::prelude::*;
use std::io::Cursor;

/// CSV 바이트를 테이블로 파싱
///
/// 첫 행은 헤더. 빈 본문(잘못된 OTP 등)은 파싱 오류가 됩니다.
pub fn read_csv(bytes: Vec<u8>) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_encoding(CsvEncoding::LossyUtf8))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// HTML 테이블을 문자열 열 테이블로 변환
pub fn from_html_table(table: &HtmlTable) -> Result<DataFrame> {
    let columns: Vec<Column> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<Option<&str>> = table
                .rows
                .iter()
                .map(|row| row.get(i).and_then(|v| v.as_deref()))
                .collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// `column` 값이 비어 있는 행 제거
pub fn drop_null_rows(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let mask = df.column(column)?.is_not_null();
    Ok(df.filter(&mask)?)
}

/// 열 값 목록 (null 제외, 행 순서 유지)
pub fn column_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    Ok(df
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

/// 테이블들을 순서대로 이어 붙임
///
/// 열 집합이 달라도 합집합(첫 등장 순서)으로 맞추고 없는 값은 null로 채웁니다.
/// 입력이 없으면 빈 테이블을 반환합니다.
pub fn concat(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut names: Vec<PlSmallStr> = Vec::new();
    for df in &frames {
        for name in df.get_column_names() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    let mut frames = frames.into_iter();
    let Some(first) = frames.next() else {
        return Ok(DataFrame::empty());
    };

    let mut combined = align_columns(first, &names)?;
    for df in frames {
        combined.vstack_mut(&align_columns(df, &names)?)?;
    }

    Ok(combined)
}

fn align_columns(mut df: DataFrame, names: &[PlSmallStr]) -> Result<DataFrame> {
    let height = df.height();
    for name in names {
        if df.column(name.as_str()).is_err() {
            df.with_column(Column::full_null(name.clone(), height, &DataType::String))?;
        }
    }
    Ok(df.select(names.iter().cloned())?)
}
