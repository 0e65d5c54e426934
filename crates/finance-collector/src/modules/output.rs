//! 수집 결과 출력.

use crate::Result;
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde::Serialize;
use std::io::Write;

/// 테이블을 헤더 포함 CSV로 출력
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    CsvWriter::new(writer).include_header(true).finish(df)?;
    Ok(())
}

/// 값을 들여쓰기한 JSON으로 출력
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
