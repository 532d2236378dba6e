//! Genre index extraction
//!
//! Kodi lists an album's genre ids and genre names as two parallel arrays.
//! The index maps each id to the name at the same position; the first
//! album (lowest album id) that mentions an id decides its name.

use krc_common::models::{Album, GenreIndex, Snapshot};

/// Add genres not yet known to `genres`, returning how many were added
pub fn extract_genres(albums: &Snapshot<Album>, genres: &mut GenreIndex) -> usize {
    let mut added = 0;

    for (album_id, album) in albums.iter() {
        for (position, genre_id) in album.genre_ids.iter().enumerate() {
            if genres.contains(*genre_id) {
                continue;
            }
            match album.genre.get(position) {
                Some(name) => {
                    tracing::debug!(genre_id, name = %name, album_id, "New genre");
                    genres.insert(*genre_id, name.clone());
                    added += 1;
                }
                None => {
                    tracing::warn!(
                        album_id,
                        genre_id,
                        ids = album.genre_ids.len(),
                        names = album.genre.len(),
                        "Genre id without a matching name"
                    );
                }
            }
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(genre_ids: &[u32], genre: &[&str]) -> Album {
        Album {
            title: "Album".to_string(),
            genre_ids: genre_ids.to_vec(),
            genre: genre.iter().map(|g| g.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_known_genre_not_overwritten() {
        let mut albums = Snapshot::new();
        albums.insert(1, album(&[1, 2], &["Rock", "Pop"]));

        let mut genres = GenreIndex::new();
        genres.insert(1, "Rock".to_string());

        let added = extract_genres(&albums, &mut genres);

        assert_eq!(added, 1);
        assert_eq!(genres.get(1).map(String::as_str), Some("Rock"));
        assert_eq!(genres.get(2).map(String::as_str), Some("Pop"));
    }

    #[test]
    fn test_first_album_wins() {
        let mut albums = Snapshot::new();
        albums.insert(9, album(&[5], &["Electronica"]));
        albums.insert(3, album(&[5], &["Electronic"]));

        let mut genres = GenreIndex::new();
        extract_genres(&albums, &mut genres);

        assert_eq!(genres.get(5).map(String::as_str), Some("Electronic"));
    }

    #[test]
    fn test_missing_name_is_skipped() {
        let mut albums = Snapshot::new();
        albums.insert(1, album(&[4, 6], &["Jazz"]));

        let mut genres = GenreIndex::new();
        let added = extract_genres(&albums, &mut genres);

        assert_eq!(added, 1);
        assert!(genres.contains(4));
        assert!(!genres.contains(6));
    }

    #[test]
    fn test_existing_index_unchanged_without_albums() {
        let mut genres = GenreIndex::new();
        genres.insert(1, "Rock".to_string());
        assert_eq!(extract_genres(&Snapshot::new(), &mut genres), 0);
        assert_eq!(genres.len(), 1);
    }
}
