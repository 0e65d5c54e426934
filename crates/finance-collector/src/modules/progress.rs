//! 진행률 표시줄.
//!
//! 표시줄은 stderr에 그려지므로 stdout 결과 출력과 섞이지 않습니다.

use indicatif::{ProgressBar, ProgressStyle};

/// 전체 수를 아는 작업용 진행률 표시줄
///
/// 전체 수는 첫 콜백에서 정해지므로 길이 0으로 시작합니다.
pub fn progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// 끝을 모르는 작업용 스피너
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb
}

/// `(처리 수, 전체 수)` 콜백을 표시줄에 반영
pub fn track(pb: &ProgressBar) -> impl FnMut(usize, usize) + '_ {
    move |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    }
}
