use std::fmt;

use jiff::{SignedDuration, Timestamp};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

use crate::error::{AppResult, FieldErrors};

pub const TITLE_MAX_CHARS: usize = 255;
pub const IMAGE_URL_MAX_CHARS: usize = 255;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";

/// A catalog entry as exchanged with clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    #[serde(serialize_with = "serialize_rating")]
    pub rating: Option<Decimal>,
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated fields for a movie that does not exist yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<Decimal>,
    pub image_url: Option<String>,
}

impl NewMovie {
    pub fn into_movie(self, id: i32, created_at: Timestamp) -> Movie {
        Movie {
            id,
            title: self.title,
            description: self.description,
            release_year: self.release_year,
            rating: self.rating,
            image_url: self.image_url,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Validated changes for an existing movie. The outer `None` leaves a field
/// untouched, `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub release_year: Option<Option<i32>>,
    pub rating: Option<Option<Decimal>>,
    pub image_url: Option<Option<String>>,
}

impl MovieChanges {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(description) = self.description {
            movie.description = description;
        }
        if let Some(release_year) = self.release_year {
            movie.release_year = release_year;
        }
        if let Some(rating) = self.rating {
            movie.rating = rating;
        }
        if let Some(image_url) = self.image_url {
            movie.image_url = image_url;
        }
    }
}

/// Request body for create and update. Each field distinguishes "absent"
/// (`None`) from an explicit JSON `null` (`Some(None)`).
#[derive(Debug, Default, Deserialize)]
pub struct MoviePayload {
    #[serde(default, deserialize_with = "present")]
    title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    release_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    rating: Option<Option<RatingInput>>,
    #[serde(default, deserialize_with = "present")]
    image_url: Option<Option<String>>,
}

impl MoviePayload {
    pub fn into_new(self) -> AppResult<NewMovie> {
        let mut errors = FieldErrors::default();

        let title = match self.title {
            Some(title) => check_title(title, &mut errors),
            None => {
                errors.add("title", REQUIRED);
                None
            }
        };
        let rating = check_rating(self.rating.flatten(), &mut errors);
        let image_url = check_image_url(self.image_url.flatten(), &mut errors);

        errors.into_result()?;

        Ok(NewMovie {
            title: title.unwrap_or_default(),
            description: self.description.flatten(),
            release_year: self.release_year.flatten(),
            rating,
            image_url,
        })
    }

    /// A full update (`partial == false`) still requires a title; a partial
    /// one only checks what it carries.
    pub fn into_changes(self, partial: bool) -> AppResult<MovieChanges> {
        let mut errors = FieldErrors::default();

        let title = match self.title {
            Some(title) => check_title(title, &mut errors),
            None if !partial => {
                errors.add("title", REQUIRED);
                None
            }
            None => None,
        };
        let rating = self.rating.map(|r| check_rating(r, &mut errors));
        let image_url = self.image_url.map(|url| check_image_url(url, &mut errors));

        errors.into_result()?;

        Ok(MovieChanges {
            title,
            description: self.description,
            release_year: self.release_year,
            rating,
            image_url,
        })
    }
}

fn check_title(title: Option<String>, errors: &mut FieldErrors) -> Option<String> {
    let Some(title) = title else {
        errors.add("title", NOT_NULL);
        return None;
    };
    let title = title.trim();
    if title.is_empty() {
        errors.add("title", NOT_BLANK);
        return None;
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
        );
        return None;
    }
    Some(title.to_string())
}

fn check_image_url(url: Option<String>, errors: &mut FieldErrors) -> Option<String> {
    let url = url?;
    if url.chars().count() > IMAGE_URL_MAX_CHARS {
        errors.add(
            "image_url",
            format!("Ensure this field has no more than {IMAGE_URL_MAX_CHARS} characters."),
        );
        return None;
    }
    Some(url)
}

/// Ratings hold at most three digits, one of them after the point. Trailing
/// zeros count, so "9.30" is rejected. Accepted values are rescaled to exactly
/// one decimal place.
fn check_rating(rating: Option<RatingInput>, errors: &mut FieldErrors) -> Option<Decimal> {
    let mut value = rating?.0;
    if value.scale() > 1 {
        errors.add("rating", "Ensure that there are no more than 1 decimal places.");
        return None;
    }
    if value.abs().trunc() >= Decimal::ONE_HUNDRED {
        errors.add("rating", "Ensure that there are no more than 2 digits before the decimal point.");
        return None;
    }
    value.rescale(1);
    Some(value)
}

pub fn rating_to_tenths(rating: Decimal) -> AppResult<i32> {
    let mut rating = rating;
    rating.rescale(1);
    i32::try_from(rating.mantissa())
        .map_err(|_| anyhow::anyhow!("rating {rating} out of range").into())
}

pub fn rating_from_tenths(tenths: i32) -> Decimal {
    Decimal::new(i64::from(tenths), 1)
}

/// Current time, truncated to the microsecond precision rows are stored at.
pub fn now() -> AppResult<Timestamp> {
    Ok(Timestamp::from_microsecond(Timestamp::now().as_microsecond())?)
}

/// Modification time for a record last touched at `previous`; always later
/// than `previous`, even when the clock has not advanced.
pub fn touched(previous: Timestamp) -> AppResult<Timestamp> {
    let now = now()?;
    if now > previous {
        return Ok(now);
    }
    Ok(previous.checked_add(SignedDuration::from_micros(1))?)
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn serialize_rating<S: Serializer>(rating: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
    match rating.and_then(|r| r.to_f64()) {
        Some(value) => s.serialize_f64(value),
        None => s.serialize_none(),
    }
}

/// A rating as sent by a client: a JSON number or a numeric string.
#[derive(Clone, Copy, Debug, PartialEq)]
struct RatingInput(Decimal);

impl<'de> Deserialize<'de> for RatingInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RatingVisitor)
    }
}

struct RatingVisitor;

impl RatingVisitor {
    fn parse<E: de::Error>(text: &str) -> Result<RatingInput, E> {
        text.trim()
            .parse::<Decimal>()
            .map(RatingInput)
            .map_err(|_| E::custom("rating: a valid number is required"))
    }
}

impl Visitor<'_> for RatingVisitor {
    type Value = RatingInput;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RatingInput(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RatingInput(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Self::parse(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Self::parse(v)
    }
}
