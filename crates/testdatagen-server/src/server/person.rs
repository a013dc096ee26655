//! Person records built around a generated identity number.
//!
//! [`FakerProvider`] feeds candidate identity numbers to the sampler, and
//! [`Person::fake`] dresses an accepted number in filler attributes (name,
//! address, phone numbers, job, e-mail) drawn from the `fake` crate.

use chrono::{Datelike, NaiveDate};
use fake::{
    Fake,
    faker::{
        address::raw::{BuildingNumber, StreetName},
        job::raw::{Position, Title},
        name::raw::{FirstName, LastName},
        phone_number::raw::{CellNumber, PhoneNumber},
    },
    locales::EN,
};
use rand::{Rng, SeedableRng, seq::IndexedRandom};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use testdatagen::{
    BatchEntry, IdentityNumber, MAX_AGE, MAX_SERIAL, PersonAttributeProvider, days_in_month,
    encode,
};

/// Header row of the `/RandomPerson` CSV export.
pub const CSV_HEADER: &str = "Personnummer;longPersonnummer;namn;efterNamn;Address;postAdress;zip;telefon;mobil;jobPosition;jobTitel;email";

/// Byte order mark prepended to CSV exports so spreadsheet tools pick UTF-8.
pub const BOM: char = '\u{FEFF}';

const MAIL_LETTERS: &[u8] = b"abcdefghijklmnopqrstvxyz";
const MAIL_DIGITS: &[u8] = b"0123456789";

/// A postal area: zip code, post town and municipality (kommun).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostalArea {
    pub zip: &'static str,
    pub town: &'static str,
    pub kommun: &'static str,
}

const fn area(zip: &'static str, town: &'static str, kommun: &'static str) -> PostalArea {
    PostalArea { zip, town, kommun }
}

pub const POSTAL_AREAS: &[PostalArea] = &[
    area("11120", "STOCKHOLM", "Stockholm"),
    area("11346", "STOCKHOLM", "Stockholm"),
    area("16440", "KISTA", "Stockholm"),
    area("17165", "SOLNA", "Solna"),
    area("18130", "LIDINGÖ", "Lidingö"),
    area("19160", "SOLLENTUNA", "Sollentuna"),
    area("41103", "GÖTEBORG", "Göteborg"),
    area("43130", "MÖLNDAL", "Mölndal"),
    area("21119", "MALMÖ", "Malmö"),
    area("22100", "LUND", "Lund"),
    area("25221", "HELSINGBORG", "Helsingborg"),
    area("58183", "LINKÖPING", "Linköping"),
    area("60220", "NORRKÖPING", "Norrköping"),
    area("70210", "ÖREBRO", "Örebro"),
    area("72211", "VÄSTERÅS", "Västerås"),
    area("75320", "UPPSALA", "Uppsala"),
    area("80320", "GÄVLE", "Gävle"),
    area("85230", "SUNDSVALL", "Sundsvall"),
    area("90326", "UMEÅ", "Umeå"),
    area("97231", "LULEÅ", "Luleå"),
    area("35230", "VÄXJÖ", "Växjö"),
    area("39231", "KALMAR", "Kalmar"),
    area("55318", "JÖNKÖPING", "Jönköping"),
    area("65224", "KARLSTAD", "Karlstad"),
    area("83130", "ÖSTERSUND", "Östersund"),
];

/// One synthetic person, serialized with the field names the service has
/// always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    #[serde(rename = "Personnummer")]
    pub personnummer: String,
    #[serde(rename = "longPersonnummer")]
    pub long_personnummer: String,
    #[serde(rename = "namn")]
    pub first_name: String,
    #[serde(rename = "efterNamn")]
    pub last_name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "postAdress")]
    pub post_town: String,
    pub zip: String,
    #[serde(rename = "telefon")]
    pub phone: String,
    #[serde(rename = "mobil")]
    pub mobile: String,
    #[serde(rename = "jobPosition")]
    pub job_position: String,
    #[serde(rename = "jobTitel")]
    pub job_title: String,
    pub email: String,
    pub kommun: String,
}

impl Person {
    /// Fills the non-identity attributes for `entry`.
    pub fn fake<R: Rng + ?Sized>(entry: &BatchEntry, rng: &mut R) -> Self {
        let street: String = StreetName(EN).fake_with_rng(rng);
        let number: String = BuildingNumber(EN).fake_with_rng(rng);
        let postal = POSTAL_AREAS
            .choose(rng)
            .copied()
            .unwrap_or(area("11120", "STOCKHOLM", "Stockholm"));
        let phone: String = PhoneNumber(EN).fake_with_rng(rng);
        let mobile: String = CellNumber(EN).fake_with_rng(rng);

        Self {
            personnummer: entry.formatted.short.clone(),
            long_personnummer: entry.formatted.long.clone(),
            first_name: FirstName(EN).fake_with_rng(rng),
            last_name: LastName(EN).fake_with_rng(rng),
            address: format!("{street} {number}"),
            post_town: postal.town.to_owned(),
            zip: postal.zip.to_owned(),
            phone: phone.replace('-', ""),
            mobile: mobile.replace('-', ""),
            job_position: Position(EN).fake_with_rng(rng),
            job_title: Title(EN).fake_with_rng(rng),
            email: fake_email(rng),
            kommun: postal.kommun.to_owned(),
        }
    }

    /// One `;`-separated CSV line in [`CSV_HEADER`] order, newline included.
    pub fn csv_row(&self) -> String {
        let fields = [
            &self.personnummer,
            &self.long_personnummer,
            &self.first_name,
            &self.last_name,
            &self.address,
            &self.post_town,
            &self.zip,
            &self.phone,
            &self.mobile,
            &self.job_position,
            &self.job_title,
            &self.email,
        ];
        let mut row = fields
            .iter()
            .map(|field| field.replace(';', ","))
            .collect::<Vec<_>>()
            .join(";");
        row.push('\n');
        row
    }
}

/// `lllllldddddd@lllllldddddd.com`-shaped address: six letters and six
/// digits on each side of the `@`.
pub fn fake_email<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut mail = String::with_capacity(30);
    for part in 0..2 {
        if part == 1 {
            mail.push('@');
        }
        for _ in 0..6 {
            mail.push(char::from(MAIL_LETTERS[rng.random_range(0..MAIL_LETTERS.len())]));
        }
        for _ in 0..6 {
            mail.push(char::from(MAIL_DIGITS[rng.random_range(0..MAIL_DIGITS.len())]));
        }
    }
    mail.push_str(".com");
    mail
}

/// Produces candidate identity numbers the way an external fake-data source
/// would: as opaque strings spread over every representable birth year.
///
/// Holders under 100 are emitted in the short `YYMMDD-SSSC` form, which the
/// century rule decodes unambiguously. Older holders are emitted in the long
/// form, which carries its century.
///
/// Every clone draws from its own stream of the base seed, so batch workers
/// never replay each other's candidates.
#[derive(Debug)]
pub struct FakerProvider {
    today: NaiveDate,
    seed: u64,
    streams: Arc<AtomicU64>,
    rng: ChaCha8Rng,
}

impl FakerProvider {
    pub fn new(today: NaiveDate, seed: u64) -> Self {
        let streams = Arc::new(AtomicU64::new(0));
        let rng = stream_rng(seed, streams.fetch_add(1, Ordering::Relaxed));
        Self {
            today,
            seed,
            streams,
            rng,
        }
    }

    fn candidate(&mut self) -> Option<String> {
        let current_year = self.today.year();
        let year = self.rng.random_range(current_year - MAX_AGE..=current_year);
        let month = self.rng.random_range(1..=12);
        let day = self.rng.random_range(1..=days_in_month(year, month));
        let serial = self.rng.random_range(0..=MAX_SERIAL);
        let id = IdentityNumber::from_ymd(year, month, day, serial)?;

        let formatted = encode(&id, self.today);
        if current_year - year < 100 {
            Some(formatted.short)
        } else {
            Some(formatted.long)
        }
    }
}

impl Clone for FakerProvider {
    fn clone(&self) -> Self {
        let stream = self.streams.fetch_add(1, Ordering::Relaxed);
        Self {
            today: self.today,
            seed: self.seed,
            streams: Arc::clone(&self.streams),
            rng: stream_rng(self.seed, stream),
        }
    }
}

impl PersonAttributeProvider for FakerProvider {
    fn raw_identity_number(&mut self) -> Option<String> {
        self.candidate()
    }
}

fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}
