use rust_decimal::Decimal;

use crate::models::NewMovie;

struct Sample {
    title: &'static str,
    description: &'static str,
    release_year: i32,
    rating_tenths: i64,
    image_url: &'static str,
}

const SAMPLES: [Sample; 5] = [
    Sample {
        title: "The Shawshank Redemption",
        description: "Two imprisoned men bond over a number of years, finding solace and eventual redemption through acts of common decency.",
        release_year: 1994,
        rating_tenths: 93,
        image_url: "https://m.media-amazon.com/images/M/MV5BNDE3ODcxYzMtY2YzZC00NmNlLWJiNDMtZDViZWM2MzIxZDYwXkEyXkFqcGdeQXVyNjAwNDUxODI@._V1_.jpg",
    },
    Sample {
        title: "The Godfather",
        description: "The aging patriarch of an organized crime dynasty transfers control of his clandestine empire to his reluctant son.",
        release_year: 1972,
        rating_tenths: 92,
        image_url: "https://m.media-amazon.com/images/M/MV5BM2MyNjYxNmUtYTAwNi00MTYxLWJmNWYtYzZlODY3ZTk3OTFlXkEyXkFqcGdeQXVyNzkwMjQ5NzM@._V1_.jpg",
    },
    Sample {
        title: "The Dark Knight",
        description: "When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.",
        release_year: 2008,
        rating_tenths: 90,
        image_url: "https://m.media-amazon.com/images/M/MV5BMTMxNTMwODM0NF5BMl5BanBnXkFtZTcwODAyMTk2Mw@@._V1_.jpg",
    },
    Sample {
        title: "Pulp Fiction",
        description: "The lives of two mob hitmen, a boxer, a gangster and his wife, and a pair of diner bandits intertwine in four tales of violence and redemption.",
        release_year: 1994,
        rating_tenths: 89,
        image_url: "https://m.media-amazon.com/images/M/MV5BNGNhMDIzZTUtNTBlZi00MTRlLWFjM2ItYzViMjE3YzI5MjljXkEyXkFqcGdeQXVyNzkwMjQ5NzM@._V1_.jpg",
    },
    Sample {
        title: "Fight Club",
        description: "An insomniac office worker and a devil-may-care soapmaker form an underground fight club that evolves into something much, much more.",
        release_year: 1999,
        rating_tenths: 88,
        image_url: "https://m.media-amazon.com/images/M/MV5BNDIzNDU0YzEtYzE5Ni00ZjlkLTk5ZjgtNjM3NWE4YzA3Nzk3XkEyXkFqcGdeQXVyMjUzOTY1NTc@._V1_.jpg",
    },
];

/// The fixed dataset loaded by `POST /movies/seed`.
pub fn sample_movies() -> Vec<NewMovie> {
    SAMPLES
        .iter()
        .map(|s| NewMovie {
            title: s.title.to_string(),
            description: Some(s.description.to_string()),
            release_year: Some(s.release_year),
            rating: Some(Decimal::new(s.rating_tenths, 1)),
            image_url: Some(s.image_url.to_string()),
        })
        .collect()
}
