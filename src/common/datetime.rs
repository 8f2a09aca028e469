// src/common/datetime.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Deslocamento fixo do "dia de negócio": America/Sao_Paulo, que não tem
/// horário de verão desde 2019. Timestamps são sempre gravados em UTC.
pub const BUSINESS_UTC_OFFSET_HOURS: i32 = -3;

/// Intervalo UTC `[início, fim)`; `None` deixa o lado aberto.
pub type UtcRange = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

fn business_offset() -> Duration {
    Duration::hours(i64::from(BUSINESS_UTC_OFFSET_HOURS))
}

/// Dia de negócio de um instante UTC.
pub fn business_day(ts: DateTime<Utc>) -> NaiveDate {
    (ts.naive_utc() + business_offset()).date()
}

/// Instante UTC da meia-noite local do dia de negócio.
pub fn business_day_start_utc(day: NaiveDate) -> DateTime<Utc> {
    (day.and_time(NaiveTime::MIN) - business_offset()).and_utc()
}

/// Intervalo UTC que cobre os dias de negócio `from..=to`.
pub fn business_range_utc(from: Option<NaiveDate>, to: Option<NaiveDate>) -> UtcRange {
    let start = from.map(business_day_start_utc);
    let end = to.and_then(|day| day.succ_opt()).map(business_day_start_utc);
    (start, end)
}
