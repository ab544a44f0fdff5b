//! TV show fixtures shared by the repository test suites

#![allow(dead_code)]

use criteria_dsl::{Collection, Embedded, Entity, Field, Reference, Specification, Value, or};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TvShow {
    pub id: i32,
    pub name: String,
    pub synopsis: String,
    pub available_on_netflix: bool,
    pub release_date: Option<String>,
    pub network_id: Option<i32>,
    #[sqlx(skip)]
    pub network: Option<Network>,
    /// Stored as `production_*` columns
    #[sqlx(skip)]
    pub production: Production,
    #[sqlx(skip)]
    pub star_ratings: Vec<StarRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Network {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Production {
    pub studio: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StarRating {
    pub id: i32,
    pub stars: i32,
}

impl Entity for TvShow {
    const TABLE: &'static str = "tv_show";
    fn id(&self) -> Value {
        self.id.into()
    }
}

impl Entity for Network {
    const TABLE: &'static str = "network";
    fn id(&self) -> Value {
        self.id.into()
    }
}

impl Entity for StarRating {
    const TABLE: &'static str = "star_rating";
    fn id(&self) -> Value {
        self.id.into()
    }
}

impl TvShow {
    pub const ID: Field<TvShow, i32> = Field::new("id");
    pub const NAME: Field<TvShow, String> = Field::new("name");
    pub const SYNOPSIS: Field<TvShow, String> = Field::new("synopsis");
    pub const AVAILABLE_ON_NETFLIX: Field<TvShow, bool> = Field::new("available_on_netflix");
    pub const RELEASE_DATE: Field<TvShow, String> = Field::new("release_date");
    pub const STAR_RATINGS: Collection<TvShow, StarRating> =
        Collection::new("star_ratings", "tv_show_id");
    pub const NETWORK: Reference<TvShow, Network> = Reference::new("network", "network_id");
    pub const PRODUCTION: Embedded<TvShow, Production> = Embedded::new("production", "production_");
}

impl Network {
    pub const NAME: Field<Network, String> = Field::new("name");
}

impl Production {
    pub const STUDIO: Field<Production, String> = Field::new("studio");
    pub const COUNTRY: Field<Production, String> = Field::new("country");
}

impl StarRating {
    pub const STARS: Field<StarRating, i32> = Field::new("stars");
}

pub fn hemlock_grove() -> TvShow {
    TvShow {
        id: 1,
        name: "Hemlock Grove".to_string(),
        synopsis: "A teenage girl is brutally murdered, sparking a hunt for her killer. But in a town where everyone hides a secret, will they find the monster among them?".to_string(),
        available_on_netflix: true,
        release_date: Some("2013".to_string()),
        network_id: Some(netflix().id),
        network: Some(netflix()),
        production: Production {
            studio: "Gaumont International Television".to_string(),
            country: "CA".to_string(),
        },
        star_ratings: Vec::new(),
    }
}

pub fn the_walking_dead() -> TvShow {
    TvShow {
        id: 2,
        name: "The Walking Dead".to_string(),
        synopsis: "Sheriff Deputy Rick Grimes leads a group of survivors in a world overrun by the walking dead. Fighting the dead, fearing the living.".to_string(),
        available_on_netflix: false,
        release_date: Some("2010".to_string()),
        network_id: Some(amc().id),
        network: Some(amc()),
        production: Production {
            studio: "AMC Studios".to_string(),
            country: "US".to_string(),
        },
        star_ratings: vec![StarRating { id: 1, stars: 3 }, StarRating { id: 2, stars: 4 }],
    }
}

pub fn better_call_saul() -> TvShow {
    TvShow {
        id: 3,
        name: "Better Call Saul".to_string(),
        synopsis: "The trials and tribulations of criminal lawyer, Jimmy McGill, in the time leading up to establishing his strip-mall law office in Albuquerque, New Mexico.".to_string(),
        available_on_netflix: false,
        release_date: None,
        network_id: Some(amc().id),
        network: Some(amc()),
        production: Production {
            studio: "Sony Pictures Television".to_string(),
            country: "US".to_string(),
        },
        star_ratings: vec![StarRating { id: 3, stars: 4 }, StarRating { id: 4, stars: 2 }],
    }
}

pub fn netflix() -> Network {
    Network {
        id: 1,
        name: "Netflix".to_string(),
    }
}

pub fn amc() -> Network {
    Network {
        id: 2,
        name: "AMC".to_string(),
    }
}

pub fn all_networks() -> Vec<Network> {
    vec![netflix(), amc()]
}

pub fn all_shows() -> Vec<TvShow> {
    vec![hemlock_grove(), the_walking_dead(), better_call_saul()]
}

/// Ids of `shows`, sorted, for order-insensitive comparison
pub fn ids(shows: &[TvShow]) -> Vec<i32> {
    let mut ids: Vec<i32> = shows.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    ids
}

// ==================== Optional filters ====================
//
// Each returns `None` for a missing input, so it drops out of `and`/`or`.

pub fn has_name(name: Option<&str>) -> Option<Specification<TvShow>> {
    name.map(|n| TvShow::NAME.equal(n))
}

pub fn available_on_netflix(available: Option<bool>) -> Option<Specification<TvShow>> {
    available.map(|a| TvShow::AVAILABLE_ON_NETFLIX.equal(a))
}

pub fn has_release_date_in(release_dates: Option<&[String]>) -> Option<Specification<TvShow>> {
    release_dates.map(|dates| TvShow::RELEASE_DATE.is_in(dates.iter().cloned()))
}

pub fn has_keyword_in(keywords: Option<&[String]>) -> Option<Specification<TvShow>> {
    keywords.map(|keywords| or(keywords.iter().map(|k| has_keyword(Some(k.as_str())))))
}

pub fn has_keyword(keyword: Option<&str>) -> Option<Specification<TvShow>> {
    keyword.map(|k| TvShow::SYNOPSIS.like(format!("%{}%", k)))
}

/// Service-layer search over TV shows; every supplied criterion must hold
#[derive(Debug, Clone, Default)]
pub struct TvShowQuery {
    pub name: Option<String>,
    pub available_on_netflix: Option<bool>,
    pub keywords: Vec<String>,
    pub release_dates: Vec<String>,
}

impl TvShowQuery {
    pub fn to_specification(&self) -> Specification<TvShow> {
        criteria_dsl::and!(
            has_name(self.name.as_deref()),
            available_on_netflix(self.available_on_netflix),
            has_keyword_in(Some(self.keywords.as_slice())),
            has_release_date_in(Some(self.release_dates.as_slice())),
        )
    }
}

/// Any of the queries may hold
pub fn any_of(queries: &[TvShowQuery]) -> Specification<TvShow> {
    or(queries.iter().map(TvShowQuery::to_specification))
}
