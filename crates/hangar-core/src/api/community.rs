//! Community feed and publishing endpoints.

use super::{ApiClient, ApiResult};
use crate::models::{CommunityPost, DumpVisibility, FeedEntry, PostRef, PublishPayload};

impl ApiClient {
    /// Fetches the public feed in server order.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn community_feed(&self) -> ApiResult<Vec<FeedEntry>> {
        self.get_list("/community/feed").await
    }

    /// Lists the signed-in account's own posts, public or hidden.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn my_posts(&self) -> ApiResult<Vec<CommunityPost>> {
        self.get_list("/community/me").await
    }

    /// Creates or updates the post for a drone (one per drone).
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn publish(&self, payload: &PublishPayload) -> ApiResult<PostRef> {
        self.post_json("/community/posts", payload).await
    }

    /// Marks one dump public or private.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn set_dump_visibility(&self, dump_id: i64, is_public: bool) -> ApiResult<DumpVisibility> {
        let body = DumpVisibility {
            id: None,
            is_public,
        };
        self.patch_json(&format!("/community/dumps/{dump_id}"), &body)
            .await
    }
}
