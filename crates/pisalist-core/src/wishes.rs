//! Private wishes, publishing to the community pool, and random draws from
//! that pool.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use pisalist_shared::patch::Patch;
use pisalist_shared::repository::{
    ById, CommunityFilter, CommunityPublisher, NewWish, Repository, WishChanges, WishFilter,
};
use pisalist_shared::{
    CoreError, CoreResult, EntityKind, PrincipalId, SharedWish, Wish, WishId, WishUpdate,
};

use crate::validation;

pub struct WishSharing<W, S, R = StdRng> {
    wishes: W,
    community: S,
    rng: Mutex<R>,
}

impl<W, S> WishSharing<W, S, StdRng>
where
    W: Repository<Wish>,
    S: Repository<SharedWish> + CommunityPublisher,
{
    pub fn new(wishes: W, community: S) -> Self {
        Self::with_rng(wishes, community, StdRng::from_entropy())
    }
}

impl<W, S, R> WishSharing<W, S, R>
where
    W: Repository<Wish>,
    S: Repository<SharedWish> + CommunityPublisher,
    R: Rng,
{
    pub fn with_rng(wishes: W, community: S, rng: R) -> Self {
        Self {
            wishes,
            community,
            rng: Mutex::new(rng),
        }
    }

    pub fn create(
        &self,
        owner: PrincipalId,
        event: String,
        description: String,
        is_cycle: bool,
    ) -> CoreResult<Wish> {
        validation::event(&event)?;

        let wish = self.wishes.insert(NewWish {
            owner_id: owner,
            event,
            description,
            is_cycle,
        })?;

        info!(wish_id = %wish.id, owner_id = %owner, "Wish created");
        Ok(wish)
    }

    pub fn update(&self, owner: PrincipalId, id: WishId, update: WishUpdate) -> CoreResult<Wish> {
        if let Patch::Set(event) = &update.event {
            validation::event(event)?;
        }

        let filter = WishFilter::one(owner, id);
        let changes = WishChanges {
            event: update.event,
            description: update.description,
            is_cycle: update.is_cycle,
        };
        if self.wishes.update_fields(&filter, &changes)? == 0 {
            return Err(CoreError::NotFound(EntityKind::Wish));
        }
        self.find(owner, id)
    }

    pub fn delete(&self, owner: PrincipalId, id: WishId) -> CoreResult<()> {
        if self.wishes.soft_delete(&WishFilter::one(owner, id))? == 0 {
            return Err(CoreError::NotFound(EntityKind::Wish));
        }
        info!(wish_id = %id, owner_id = %owner, "Wish deleted");
        Ok(())
    }

    pub fn list_mine(&self, owner: PrincipalId) -> CoreResult<Vec<Wish>> {
        Ok(self.wishes.find_many(&WishFilter::owned_by(owner), ById)?)
    }

    /// Publish a snapshot of the wish to the community pool.
    ///
    /// Content is copied by value; later edits of the wish do not reach the
    /// snapshot. Sharing the same wish again publishes another snapshot. The
    /// snapshot and the `is_shared` flag are written in one store transaction.
    pub fn share(&self, owner: PrincipalId, id: WishId) -> CoreResult<SharedWish> {
        let shared = self
            .community
            .publish(owner, id)?
            .ok_or(CoreError::NotFound(EntityKind::Wish))?;

        info!(wish_id = %id, shared_wish_id = %shared.id, "Wish shared to community");
        Ok(shared)
    }

    pub fn list_community(&self) -> CoreResult<Vec<SharedWish>> {
        Ok(self.community.find_many(&CommunityFilter::all(), ById)?)
    }

    /// Pick one entry of the community pool uniformly at random.
    pub fn draw_random(&self) -> CoreResult<SharedWish> {
        let pool = CommunityFilter::all();
        let size = self.community.count(&pool)?;
        if size == 0 {
            return Err(CoreError::NotFound(EntityKind::SharedWish));
        }

        let offset = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..size);

        // The pool may have shrunk since it was counted.
        self.community
            .fetch_at_offset(&pool, ById, offset)?
            .ok_or(CoreError::NotFound(EntityKind::SharedWish))
    }

    fn find(&self, owner: PrincipalId, id: WishId) -> CoreResult<Wish> {
        self.wishes
            .find_one(&WishFilter::one(owner, id))?
            .ok_or(CoreError::NotFound(EntityKind::Wish))
    }
}
