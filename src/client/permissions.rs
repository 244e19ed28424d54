//! Check, grant and revoke.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use tracing::{debug, error, instrument};

use crate::error::Error;
use crate::types::wire::{CheckBody, CheckReply, MutationReply, TupleBody};
use crate::types::{relation_for, ContextualTuple};

use super::Client;

// ── Check ───────────────────────────────────────────────────────

/// Builder for a permission check.
///
/// Awaiting the builder yields a plain `bool` and never fails: any error is
/// logged and the check is denied. Use [`send`](CheckRequest::send) to get
/// the error instead.
pub struct CheckRequest<'a> {
    client: &'a Client,
    user: String,
    relation: String,
    resource: String,
    contextual_tuples: Vec<ContextualTuple>,
}

impl<'a> CheckRequest<'a> {
    /// Adds contextual tuples to send with the check.
    pub fn contextual_tuples(mut self, tuples: impl IntoIterator<Item = ContextualTuple>) -> Self {
        self.contextual_tuples.extend(tuples);
        self
    }

    /// Adds a single contextual tuple.
    pub fn contextual_tuple(mut self, tuple: ContextualTuple) -> Self {
        self.contextual_tuples.push(tuple);
        self
    }

    /// Returns the relation the permission was mapped to.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Runs the check and reports failures as errors.
    ///
    /// The cache is consulted and populated exactly as when awaiting the
    /// builder directly; failed checks are never cached.
    pub async fn send(self) -> Result<bool, Error> {
        self.client
            .resolve_check(
                &self.user,
                &self.relation,
                &self.resource,
                &self.contextual_tuples,
            )
            .await
    }
}

impl<'a> IntoFuture for CheckRequest<'a> {
    type Output = bool;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let result = self
                .client
                .resolve_check(
                    &self.user,
                    &self.relation,
                    &self.resource,
                    &self.contextual_tuples,
                )
                .await;

            match result {
                Ok(allowed) => allowed,
                Err(e) => {
                    error!(
                        operation = "check",
                        tenant = %self.client.tenant,
                        user = %self.user,
                        relation = %self.relation,
                        resource = %self.resource,
                        error = %e,
                        "error checking permission; denying"
                    );
                    false
                }
            }
        })
    }
}

// ── Grant / Revoke ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Grant,
    Revoke,
}

impl Mutation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

// ── Client methods ──────────────────────────────────────────────

impl Client {
    /// Checks whether `user` holds `permission` on `resource`.
    ///
    /// The permission is mapped to a relation (`read` → `reader`, ...).
    /// A cached result is returned without contacting the service; otherwise
    /// the service is asked and a successful answer is cached. Use
    /// `.contextual_tuples()` on the returned builder to add context.
    ///
    /// ```rust,no_run
    /// use tupelo::{Client, ContextualTuple};
    ///
    /// # async fn example(client: Client) {
    /// let allowed = client
    ///     .check("alice", "read", "doc1")
    ///     .contextual_tuple(ContextualTuple::new("alice", "member", "group:eng"))
    ///     .await;
    /// # }
    /// ```
    pub fn check(
        &self,
        user: impl Into<String>,
        permission: impl AsRef<str>,
        resource: impl Into<String>,
    ) -> CheckRequest<'_> {
        CheckRequest {
            client: self,
            user: user.into(),
            relation: relation_for(permission.as_ref()).to_owned(),
            resource: resource.into(),
            contextual_tuples: Vec::new(),
        }
    }

    /// Grants `permission` on `resource` to `user`.
    ///
    /// Returns `true` once the service confirms; the cached check result for
    /// exactly this tuple is then dropped. Any failure is logged and reported
    /// as `false`, leaving the cache untouched.
    pub async fn grant(
        &self,
        user: impl AsRef<str>,
        permission: impl AsRef<str>,
        resource: impl AsRef<str>,
    ) -> bool {
        self.mutate_or_log(
            Mutation::Grant,
            user.as_ref(),
            relation_for(permission.as_ref()),
            resource.as_ref(),
        )
        .await
    }

    /// Revokes `permission` on `resource` from `user`.
    ///
    /// Same contract as [`grant`](Client::grant).
    pub async fn revoke(
        &self,
        user: impl AsRef<str>,
        permission: impl AsRef<str>,
        resource: impl AsRef<str>,
    ) -> bool {
        self.mutate_or_log(
            Mutation::Revoke,
            user.as_ref(),
            relation_for(permission.as_ref()),
            resource.as_ref(),
        )
        .await
    }

    /// Like [`grant`](Client::grant), but returns the failure.
    pub async fn try_grant(
        &self,
        user: impl AsRef<str>,
        permission: impl AsRef<str>,
        resource: impl AsRef<str>,
    ) -> Result<(), Error> {
        self.mutate(
            Mutation::Grant,
            user.as_ref(),
            relation_for(permission.as_ref()),
            resource.as_ref(),
        )
        .await
    }

    /// Like [`revoke`](Client::revoke), but returns the failure.
    pub async fn try_revoke(
        &self,
        user: impl AsRef<str>,
        permission: impl AsRef<str>,
        resource: impl AsRef<str>,
    ) -> Result<(), Error> {
        self.mutate(
            Mutation::Revoke,
            user.as_ref(),
            relation_for(permission.as_ref()),
            resource.as_ref(),
        )
        .await
    }

    #[instrument(skip(self, contextual_tuples), fields(tenant = %self.tenant))]
    async fn resolve_check(
        &self,
        user: &str,
        relation: &str,
        resource: &str,
        contextual_tuples: &[ContextualTuple],
    ) -> Result<bool, Error> {
        let key = self.cache_key(user, relation, resource);
        if let Some(allowed) = self.cache.get(&key) {
            debug!(allowed, "cache hit");
            return Ok(allowed);
        }

        let generation = self.cache.generation();
        let body = CheckBody {
            user,
            relation,
            object: resource,
            contextual_tuples,
        };
        let reply: CheckReply = self.post(&self.endpoints.check, &body).await?;

        if self.cache.insert_if_current(key, reply.allowed, generation) {
            debug!(allowed = reply.allowed, "cached check result");
        } else {
            debug!(
                allowed = reply.allowed,
                "check result not cached; cache disabled or invalidated in flight"
            );
        }
        Ok(reply.allowed)
    }

    #[instrument(
        skip(self),
        fields(operation = mutation.as_str(), tenant = %self.tenant)
    )]
    async fn mutate(
        &self,
        mutation: Mutation,
        user: &str,
        relation: &str,
        resource: &str,
    ) -> Result<(), Error> {
        let url = match mutation {
            Mutation::Grant => &self.endpoints.grant,
            Mutation::Revoke => &self.endpoints.revoke,
        };
        let body = TupleBody {
            user,
            relation,
            object: resource,
        };
        let reply: MutationReply = self.post(url, &body).await?;

        if !reply.is_success() {
            return Err(Error::Rejected {
                status: reply.status,
            });
        }

        let removed = self.cache.remove(&self.cache_key(user, relation, resource));
        debug!(removed, "relationship updated; cache invalidated");
        Ok(())
    }

    async fn mutate_or_log(
        &self,
        mutation: Mutation,
        user: &str,
        relation: &str,
        resource: &str,
    ) -> bool {
        match self.mutate(mutation, user, relation, resource).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    operation = mutation.as_str(),
                    tenant = %self.tenant,
                    user,
                    relation,
                    resource,
                    error = %e,
                    "error updating relationship"
                );
                false
            }
        }
    }
}
