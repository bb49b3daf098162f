//! 싱크 라이터 -- 바이트 싱크 계약을 구현하는 외부 진입점
//!
//! [`SinkWriter`]는 `write(bytes) -> Result<usize, _>` 계약으로 원시 로그 라인을 받아
//! 레벨 감지, 필터링, 헤더 조립, 색상, 직렬화를 거쳐 하위 싱크에 씁니다.
//!
//! # 동시성
//! 한 라이터의 감지부터 하위 싱크 쓰기까지는 하나의 뮤텍스 구간에서 실행됩니다.
//! 포맷 인자로 메시지를 채우는 단계는 그 전에, 잠금 밖에서 실행됩니다.
//! 색상 맵은 별도의 읽기/쓰기 잠금, 레코드 풀은 자체 잠금을 사용합니다.
//! 내부 진단 로그(`tracing`)는 항상 잠금을 놓은 뒤에 기록합니다.
//!
//! # 쓰기 실패
//! 짧은 쓰기나 I/O 에러는 재시도하지 않습니다.
//! [`WriteErrorPolicy::Propagate`]이면 호출자에게 반환하고,
//! [`WriteErrorPolicy::Report`]이면 표준 에러에 보고한 뒤 성공으로 처리합니다.
//! 두 경우 모두 [`SinkWriter::write_errors`] 카운터가 증가합니다.

use std::fmt;
use std::io::{IsTerminal, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use loglet_core::config::SinkConfig;
use loglet_core::error::ConfigError;
use loglet_core::{CustomColor, Flags, Format, Level, WriteErrorPolicy};

use crate::color::ColorResolver;
use crate::error::SinkError;
use crate::level::LevelGate;
use crate::pool::{PooledRecord, RecordPool};
use crate::record::{CallSite, RecordBuilder};

/// `write` 경로에서 호출 위치 해석 함수와 사용자 코드 사이의 내부 프레임 수
///
/// - `finish -> build -> emit -> write_bytes | Write::write -> 사용자 코드`
/// - `finish -> build_filled -> log_with -> Write::write_fmt -> 사용자 코드`
const WRITE_PATH_FRAMES: usize = 4;

/// 뮤텍스로 보호되는 라이터 상태
struct SinkState {
    /// 하위 바이트 싱크
    out: Box<dyn Write + Send>,
    /// 출력 형식
    format: Format,
    /// 필드 플래그
    flags: Flags,
    /// 색상 출력 여부
    color: bool,
    /// 최소 레벨 필터
    gate: LevelGate,
    /// 쓰기 실패 처리 정책
    on_write_error: WriteErrorPolicy,
    /// 사용자 래퍼가 추가하는 호출 깊이
    call_depth: usize,
    /// 현재 시각 공급자
    clock: fn() -> DateTime<Utc>,
}

impl SinkState {
    /// 스택 탐색 호출 위치에 사용자 호출 깊이를 더합니다.
    fn adjust<'a>(&self, site: CallSite<'a>) -> CallSite<'a> {
        match site {
            CallSite::Walk(skip) => CallSite::Walk(skip + self.call_depth),
            other => other,
        }
    }

    fn builder<'a>(&'a self, colors: &'a ColorResolver) -> RecordBuilder<'a> {
        RecordBuilder {
            format: self.format,
            flags: self.flags,
            color: self.color,
            gate: &self.gate,
            colors,
            clock: self.clock,
        }
    }
}

/// 로그 라인 싱크 라이터
///
/// # 사용 예시
/// ```
/// use loglet_pipeline::{Flags, SinkWriter};
///
/// let writer = SinkWriter::builder()
///     .output(Vec::new())
///     .flags(Flags::empty())
///     .min_level("INFO")
///     .build()
///     .unwrap();
///
/// assert_eq!(writer.write_bytes(b"[DEBUG] cache miss\n").unwrap(), 19);
/// writer.write_bytes(b"[ERROR] disk full\n").unwrap();
/// ```
pub struct SinkWriter {
    state: Mutex<SinkState>,
    colors: ColorResolver,
    pool: RecordPool,
    write_errors: AtomicU64,
}

impl SinkWriter {
    /// 기본 설정(pretty, 날짜+시각, 색상 없음, 모든 레벨 출력)으로 라이터를 생성합니다.
    pub fn new<W>(out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::from_parts(Box::new(out), SinkWriterBuilder::new())
    }

    /// 표준 에러로 출력하는 라이터를 생성합니다.
    ///
    /// 표준 에러가 터미널이면 색상을 켭니다.
    pub fn stderr() -> Self {
        let color = std::io::stderr().is_terminal();
        Self::from_parts(
            Box::new(std::io::stderr()),
            SinkWriterBuilder::new().color(color),
        )
    }

    /// 빌더를 생성합니다.
    pub fn builder() -> SinkWriterBuilder {
        SinkWriterBuilder::new()
    }

    /// 검증이 끝난 빌더 값으로 라이터를 조립합니다.
    fn from_parts(out: Box<dyn Write + Send>, builder: SinkWriterBuilder) -> Self {
        let min = builder
            .min_level
            .or_else(|| builder.levels.first().cloned())
            .unwrap_or_default();
        let colors = ColorResolver::new();
        for (key, color) in builder.custom_colors {
            colors.set_custom(key, color);
        }

        Self {
            state: Mutex::new(SinkState {
                out,
                format: builder.format,
                flags: builder.flags,
                color: builder.color,
                gate: LevelGate::new(builder.levels, min),
                on_write_error: builder.on_write_error,
                call_depth: builder.call_depth,
                clock: builder.clock,
            }),
            colors,
            pool: RecordPool::new(),
            write_errors: AtomicU64::new(0),
        }
    }

    /// 원시 로그 라인을 처리해 하위 싱크에 씁니다.
    ///
    /// 끝의 개행 하나는 처리 전에 떼어내고 출력 시 다시 붙입니다.
    /// 필터에 걸린 메시지는 에러가 아니며, 입력 길이 전체를 쓴 것으로 보고합니다.
    #[inline(never)]
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<usize, SinkError> {
        self.emit(bytes, CallSite::Walk(WRITE_PATH_FRAMES))
    }

    /// 레벨을 지정해 포맷 인자를 기록합니다.
    ///
    /// 메시지 앞의 레벨 토큰은 감지하지 않고 그대로 출력합니다.
    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) -> Result<(), SinkError> {
        self.log_formatted(Some(level), args, CallSite::Location(Location::caller()))
    }

    /// 레벨 없이 포맷 인자를 기록합니다. 메시지 앞의 레벨 토큰은 감지됩니다.
    #[track_caller]
    pub fn print(&self, args: fmt::Arguments<'_>) -> Result<(), SinkError> {
        self.log_formatted(None, args, CallSite::Location(Location::caller()))
    }

    /// 메시지 버퍼를 직접 채워 기록합니다.
    ///
    /// `fill`은 상태 잠금 밖에서 풀에서 꺼낸 버퍼에 바로 씁니다. 따라서 `fill` 안의
    /// `Display`/`Debug` 구현이 같은 라이터로 다시 기록해도 교착되지 않습니다.
    /// 레벨이 지정되었고 필터에 걸리면 `fill`은 호출되지 않습니다.
    #[inline(never)]
    pub fn log_with<F>(&self, level: Option<Level>, site: CallSite<'_>, fill: F) -> Result<(), SinkError>
    where
        F: FnOnce(&mut Vec<u8>),
    {
        if level.is_some() {
            let allowed = self.state.lock().gate.allow(level);
            if !allowed {
                return Ok(());
            }
        }

        let mut record = self.pool.acquire();
        fill(&mut record.message);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let site = state.adjust(site);
        let record = state
            .builder(&self.colors)
            .build_filled(record, level, site);
        let Some(record) = record else {
            return Ok(());
        };
        let result = write_record(&mut state.out, &record);
        let policy = state.on_write_error;
        drop(guard);
        drop(record);

        self.settle(result, policy)
    }

    fn log_formatted(
        &self,
        level: Option<Level>,
        args: fmt::Arguments<'_>,
        site: CallSite<'_>,
    ) -> Result<(), SinkError> {
        self.log_with(level, site, |buf| {
            // Vec<u8>에 대한 쓰기는 실패하지 않는다
            let _ = buf.write_fmt(args);
        })
    }

    #[inline(never)]
    fn emit(&self, bytes: &[u8], site: CallSite<'_>) -> Result<usize, SinkError> {
        let message = bytes.strip_suffix(b"\n").unwrap_or(bytes);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let site = state.adjust(site);
        let record = state
            .builder(&self.colors)
            .build(&self.pool, None, message, site);
        let Some(record) = record else {
            return Ok(bytes.len());
        };
        let result = write_record(&mut state.out, &record);
        drop(record);
        let policy = state.on_write_error;
        drop(guard);

        self.settle(result, policy).map(|()| bytes.len())
    }

    /// 쓰기 결과에 실패 정책을 적용합니다. 잠금을 놓은 뒤에 호출해야 합니다.
    fn settle(&self, result: Result<(), SinkError>, policy: WriteErrorPolicy) -> Result<(), SinkError> {
        let Err(err) = result else {
            return Ok(());
        };
        self.write_errors.fetch_add(1, Ordering::Relaxed);

        match policy {
            WriteErrorPolicy::Propagate => Err(err),
            WriteErrorPolicy::Report => {
                // tracing을 거치면 SinkLayer를 통해 같은 싱크로 되돌아올 수 있다
                let _ = writeln!(std::io::stderr(), "loglet: failed to write log line: {err}");
                Ok(())
            }
        }
    }

    /// 출력 형식을 설정합니다.
    pub fn set_format(&self, format: Format) {
        self.state.lock().format = format;
        tracing::debug!(?format, "sink format changed");
    }

    /// 현재 필드 플래그를 반환합니다.
    pub fn flags(&self) -> Flags {
        self.state.lock().flags
    }

    /// 필드 플래그를 설정합니다.
    pub fn set_flags(&self, flags: Flags) {
        self.state.lock().flags = flags;
        tracing::debug!(flags = flags.bits(), "sink flags changed");
    }

    /// 색상 출력을 켜거나 끕니다.
    pub fn set_color(&self, color: bool) {
        self.state.lock().color = color;
        tracing::debug!(color, "sink color changed");
    }

    /// 최소 레벨을 설정합니다.
    ///
    /// # Errors
    /// 레벨 목록에 없는 이름이면 [`ConfigError::UnknownLevel`]을 반환합니다.
    pub fn set_min_level(&self, name: &str) -> Result<(), SinkError> {
        {
            let mut state = self.state.lock();
            if !state.gate.knows(name) {
                return Err(ConfigError::UnknownLevel(name.to_owned()).into());
            }
            state.gate.set_min_level(name);
        }
        tracing::debug!(min_level = name, "sink minimum level changed");
        Ok(())
    }

    /// 레벨 이름 목록(심각도 오름차순)을 교체합니다.
    ///
    /// 현재 최소 레벨이 새 목록에 없으면 새 목록의 첫 이름으로 재설정합니다.
    ///
    /// # Errors
    /// 목록이 비었거나 빈 이름이 있으면 [`ConfigError::InvalidValue`]를 반환합니다.
    pub fn set_levels(&self, levels: Vec<String>) -> Result<(), SinkError> {
        validate_levels(&levels)?;
        let reset = {
            let mut state = self.state.lock();
            let reset = if levels.iter().any(|l| l == state.gate.min_level()) {
                None
            } else {
                levels.first().cloned()
            };
            state.gate.set_levels(levels);
            if let Some(min) = &reset {
                state.gate.set_min_level(min.clone());
            }
            reset
        };
        match reset {
            Some(min) => tracing::debug!(min_level = %min, "sink levels changed, minimum reset"),
            None => tracing::debug!("sink levels changed"),
        }
        Ok(())
    }

    /// 현재 최소 레벨 이름을 반환합니다.
    pub fn min_level(&self) -> String {
        self.state.lock().gate.min_level().to_owned()
    }

    /// 레벨 또는 접두사에 사용자 정의 색상을 등록합니다.
    pub fn set_custom_color(&self, key: impl Into<String>, color: CustomColor) {
        self.colors.set_custom(key, color);
    }

    /// 정수 성분 `[전경색, 배경색?, 스타일?]`으로 사용자 정의 색상을 등록합니다.
    ///
    /// # Errors
    /// 성분이 비었거나 범위를 벗어나면 [`ConfigError::InvalidColor`]를 반환합니다.
    pub fn set_custom_components(&self, key: &str, components: &[i64]) -> Result<(), SinkError> {
        self.colors.set_custom_components(key, components)?;
        Ok(())
    }

    /// 색상 해석기를 반환합니다.
    pub fn colors(&self) -> &ColorResolver {
        &self.colors
    }

    /// 하위 싱크를 교체하고 이전 싱크를 반환합니다.
    pub fn set_output<W>(&self, out: W) -> Box<dyn Write + Send>
    where
        W: Write + Send + 'static,
    {
        std::mem::replace(&mut self.state.lock().out, Box::new(out))
    }

    /// 쓰기 실패 처리 정책을 설정합니다.
    pub fn set_write_error_policy(&self, policy: WriteErrorPolicy) {
        self.state.lock().on_write_error = policy;
        tracing::debug!(?policy, "sink write error policy changed");
    }

    /// `write` 경로에서 건너뛸 추가 호출 깊이를 설정합니다.
    ///
    /// 라이터를 감싸는 함수가 있으면 그 깊이만큼 지정해야 호출 위치가 맞게 나옵니다.
    pub fn set_call_depth(&self, depth: usize) {
        self.state.lock().call_depth = depth;
    }

    /// 디버그 모드로 전환합니다.
    ///
    /// 날짜, 시각, 마이크로초, 짧은 호출 위치를 켜고 최소 레벨을 목록의 가장 낮은 레벨로 내립니다.
    pub fn debug_mode(&self) {
        let min = {
            let mut state = self.state.lock();
            state.flags = Flags::STD | Flags::MICROSECONDS | Flags::SHORT_FILE;
            let lowest = state.gate.levels().first().cloned();
            if let Some(lowest) = &lowest {
                state.gate.set_min_level(lowest.clone());
            }
            lowest
        };
        tracing::debug!(min_level = ?min, "sink debug mode enabled");
    }

    /// 지금까지 실패한 하위 싱크 쓰기 횟수를 반환합니다.
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// 하위 싱크를 flush합니다.
    pub fn flush(&self) -> Result<(), SinkError> {
        self.state.lock().out.flush()?;
        Ok(())
    }
}

impl fmt::Debug for SinkWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SinkWriter")
            .field("format", &state.format)
            .field("flags", &state.flags)
            .field("color", &state.color)
            .field("min_level", &state.gate.min_level())
            .field("on_write_error", &state.on_write_error)
            .field("write_errors", &self.write_errors())
            .finish_non_exhaustive()
    }
}

impl Write for SinkWriter {
    #[inline(never)]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(self.emit(buf, CallSite::Walk(WRITE_PATH_FRAMES))?)
    }

    /// 포맷 조각마다 `write`를 부르지 않고 한 줄 전체를 레코드 하나로 기록합니다.
    #[inline(never)]
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> std::io::Result<()> {
        let site = CallSite::Walk(WRITE_PATH_FRAMES);
        Ok(self.log_with(None, site, |buf| {
            // Vec<u8>에 대한 쓰기는 실패하지 않는다
            let _ = buf.write_fmt(args);
        })?)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(SinkWriter::flush(self)?)
    }
}

impl Write for &SinkWriter {
    #[inline(never)]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(self.emit(buf, CallSite::Walk(WRITE_PATH_FRAMES))?)
    }

    /// 포맷 조각마다 `write`를 부르지 않고 한 줄 전체를 레코드 하나로 기록합니다.
    #[inline(never)]
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> std::io::Result<()> {
        let site = CallSite::Walk(WRITE_PATH_FRAMES);
        Ok(self.log_with(None, site, |buf| {
            // Vec<u8>에 대한 쓰기는 실패하지 않는다
            let _ = buf.write_fmt(args);
        })?)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(SinkWriter::flush(self)?)
    }
}

/// 직렬화된 레코드를 하위 싱크에 한 번에 씁니다. 재시도하지 않습니다.
fn write_record(out: &mut Box<dyn Write + Send>, record: &PooledRecord<'_>) -> Result<(), SinkError> {
    let output = record.output();
    let written = out.write(output)?;
    if written != output.len() {
        return Err(SinkError::ShortWrite {
            written,
            expected: output.len(),
        });
    }
    Ok(())
}

fn validate_levels(levels: &[String]) -> Result<(), ConfigError> {
    if levels.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "levels".to_owned(),
            reason: "must contain at least one level".to_owned(),
        });
    }
    if levels.iter().any(|l| l.is_empty()) {
        return Err(ConfigError::InvalidValue {
            field: "levels".to_owned(),
            reason: "level names must not be empty".to_owned(),
        });
    }
    Ok(())
}

/// [`SinkWriter`] 빌더
pub struct SinkWriterBuilder {
    output: Option<Box<dyn Write + Send>>,
    format: Format,
    flags: Flags,
    color: bool,
    levels: Vec<String>,
    min_level: Option<String>,
    custom_colors: Vec<(String, CustomColor)>,
    on_write_error: WriteErrorPolicy,
    call_depth: usize,
    clock: fn() -> DateTime<Utc>,
}

impl SinkWriterBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            output: None,
            format: Format::Pretty,
            flags: Flags::STD,
            color: false,
            levels: Level::default_names(),
            min_level: None,
            custom_colors: Vec::new(),
            on_write_error: WriteErrorPolicy::Propagate,
            call_depth: 0,
            clock: Utc::now,
        }
    }

    /// 설정 파일 값으로 빌더를 생성합니다. 출력 싱크는 따로 지정해야 합니다.
    ///
    /// # Errors
    /// 사용자 정의 색상 값이 잘못되었으면 [`ConfigError::InvalidColor`]를 반환합니다.
    pub fn from_config(config: &SinkConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            format: config.format,
            flags: config.flags(),
            color: config.color,
            levels: config.levels.clone(),
            min_level: Some(config.min_level.clone()),
            custom_colors: config.custom_colors()?,
            on_write_error: config.on_write_error,
            ..Self::new()
        })
    }

    /// 하위 싱크를 설정합니다. 지정하지 않으면 표준 에러를 사용합니다.
    pub fn output<W>(mut self, out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.output = Some(Box::new(out));
        self
    }

    /// 출력 형식을 설정합니다.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// 필드 플래그를 설정합니다.
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// 색상 출력 여부를 설정합니다.
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// 레벨 이름 목록(심각도 오름차순)을 설정합니다.
    pub fn levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.levels = levels.into_iter().map(Into::into).collect();
        self
    }

    /// 최소 레벨을 설정합니다. 지정하지 않으면 목록의 첫 레벨입니다.
    pub fn min_level(mut self, name: impl Into<String>) -> Self {
        self.min_level = Some(name.into());
        self
    }

    /// 사용자 정의 색상을 추가합니다.
    pub fn custom_color(mut self, key: impl Into<String>, color: CustomColor) -> Self {
        self.custom_colors.push((key.into(), color));
        self
    }

    /// 쓰기 실패 처리 정책을 설정합니다.
    pub fn on_write_error(mut self, policy: WriteErrorPolicy) -> Self {
        self.on_write_error = policy;
        self
    }

    /// `write` 경로의 추가 호출 깊이를 설정합니다.
    pub fn call_depth(mut self, depth: usize) -> Self {
        self.call_depth = depth;
        self
    }

    /// 현재 시각 공급자를 설정합니다.
    pub fn clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// 라이터를 생성합니다.
    ///
    /// # Errors
    /// - 레벨 목록이 비었거나 빈 이름이 있으면 [`ConfigError::InvalidValue`]
    /// - 최소 레벨이 목록에 없으면 [`ConfigError::UnknownLevel`]
    pub fn build(mut self) -> Result<SinkWriter, SinkError> {
        validate_levels(&self.levels)?;
        if let Some(min) = &self.min_level {
            if !self.levels.contains(min) {
                return Err(ConfigError::UnknownLevel(min.clone()).into());
            }
        }

        let out = self
            .output
            .take()
            .unwrap_or_else(|| Box::new(std::io::stderr()));
        let writer = SinkWriter::from_parts(out, self);
        tracing::debug!(?writer, "sink writer built");
        Ok(writer)
    }
}

impl Default for SinkWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
