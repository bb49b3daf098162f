//! 레코드 재사용 풀
//!
//! 로그 호출마다 버퍼를 새로 할당하지 않도록 [`Record`]를 재사용합니다.
//! [`RecordPool::acquire`]가 돌려주는 [`PooledRecord`]는 drop될 때 자동으로
//! 풀에 반환됩니다. 반환 시점의 버퍼 용량이 [`MAX_POOLED_CAPACITY`] 이상이면
//! 풀에 넣지 않고 버립니다.
//!
//! 풀은 순서나 공정성을 보장하지 않습니다.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use crate::record::Record;

/// 풀에 반환할 수 있는 최대 버퍼 용량 (64 KiB)
pub const MAX_POOLED_CAPACITY: usize = 1 << 16;

/// 기본 최대 유휴 레코드 수
const DEFAULT_MAX_IDLE: usize = 64;

/// 레코드 재사용 풀
#[derive(Debug)]
pub struct RecordPool {
    /// 유휴 레코드 목록
    free: Mutex<Vec<Record>>,
    /// 보관할 최대 유휴 레코드 수
    max_idle: usize,
}

impl RecordPool {
    /// 기본 크기의 풀을 생성합니다.
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// 최대 유휴 레코드 수를 지정해 풀을 생성합니다.
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// 풀에서 레코드를 꺼냅니다. 비어 있으면 새로 만듭니다.
    ///
    /// 꺼낸 레코드의 모든 필드는 비어 있습니다.
    pub fn acquire(&self) -> PooledRecord<'_> {
        let record = self.free.lock().pop().unwrap_or_default();
        PooledRecord { pool: self, record }
    }

    /// 레코드를 풀에 반환합니다.
    ///
    /// 버퍼 용량이 [`MAX_POOLED_CAPACITY`] 이상이거나 풀이 가득 찼으면 버립니다.
    pub fn release(&self, mut record: Record) {
        if record.capacity() >= MAX_POOLED_CAPACITY {
            return;
        }
        record.clear();

        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(record);
        }
    }

    /// 현재 유휴 레코드 수를 반환합니다.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new()
    }
}

/// 풀에서 꺼낸 레코드
///
/// drop될 때 원래 풀로 반환됩니다.
#[derive(Debug)]
pub struct PooledRecord<'a> {
    pool: &'a RecordPool,
    record: Record,
}

impl Deref for PooledRecord<'_> {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.record
    }
}

impl DerefMut for PooledRecord<'_> {
    fn deref_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl Drop for PooledRecord<'_> {
    fn drop(&mut self) {
        let record = std::mem::take(&mut self.record);
        self.pool.release(record);
    }
}
