use rand::Rng;
use shared::domain::{Album, Post, Resource, User};

use crate::error::{FeedError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSeed {
    pub user: User,
    pub album: Album,
    pub post: Post,
}

/// Draws `count` (user, album, post) triples. Each pick is uniform, with
/// replacement, and independent of the other two.
pub fn compose_rows<R: Rng + ?Sized>(
    users: &[User],
    albums: &[Album],
    posts: &[Post],
    count: usize,
    rng: &mut R,
) -> Result<Vec<RowSeed>> {
    if users.is_empty() {
        return Err(FeedError::EmptyCollection(Resource::Users));
    }
    if albums.is_empty() {
        return Err(FeedError::EmptyCollection(Resource::Albums));
    }
    if posts.is_empty() {
        return Err(FeedError::EmptyCollection(Resource::Posts));
    }

    Ok((0..count)
        .map(|_| RowSeed {
            user: pick(users, rng).clone(),
            album: pick(albums, rng).clone(),
            post: pick(posts, rng).clone(),
        })
        .collect())
}

fn pick<'a, T, R: Rng + ?Sized>(pool: &'a [T], rng: &mut R) -> &'a T {
    &pool[rng.random_range(0..pool.len())]
}
