//! The identity-linking algorithm.
//!
//! Given an incoming (email, phone) pair, [`resolve`] finds every contact
//! sharing either identifier, settles the cluster root, merges clusters the
//! pair bridges, records any new identifier as a secondary, and returns the
//! consolidated view. At most one contact is inserted per call.
//!
//! Invariant maintained on every write: a secondary's `linked_id` points
//! directly at a primary. Legacy rows may still hold chained links, so
//! clusters are always gathered transitively, and [`resolve`] re-points every
//! chained member it gathers at the root.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::{
  Error,
  contact::{Contact, ContactId, LinkPrecedence, NewContact},
  identity::{ConsolidatedIdentity, IdentifyRequest, Outcome, Resolution},
  repository::ContactRepository,
};

/// Resolve `request` against `repo`.
///
/// Validation happens before any repository access. The caller is expected
/// to run this inside one transaction and discard all writes on error.
pub fn resolve<R: ContactRepository>(
  repo: &mut R,
  request: &IdentifyRequest,
) -> Result<Resolution, R::Error> {
  request.validate()?;

  let email = request.email.as_deref();
  let phone = request.phone_number.as_deref();

  let matches = repo.find_by_email_or_phone(email, phone)?;

  if matches.is_empty() {
    let contact = repo.insert(NewContact::primary(
      request.email.clone(),
      request.phone_number.clone(),
    ))?;
    tracing::info!(contact_id = contact.id, "created primary contact");
    return Ok(Resolution {
      identity: ConsolidatedIdentity::from_cluster(
        contact.id,
        std::slice::from_ref(&contact),
      ),
      outcome:  Outcome::CreatedPrimary(contact.id),
      demoted:  Vec::new(),
    });
  }

  let mut roots = matched_roots(repo, &matches)?.into_keys();
  let Some(root) = roots.next() else {
    // Every match yields a root, so this is unreachable for a sane backend.
    return Err(Error::ContactNotFound(matches[0].root_candidate()).into());
  };

  let mut demoted = Vec::new();
  for absorbed in roots {
    merge_into(repo, root, absorbed)?;
    demoted.push(absorbed);
  }
  tracing::debug!(root, matched = matches.len(), "resolved cluster root");

  let mut cluster = gather_cluster(repo, root)?;
  for member in &mut cluster {
    if member.id != root && member.linked_id != Some(root) {
      repo.update_link(member.id, LinkPrecedence::Secondary, Some(root))?;
      member.linked_id = Some(root);
      tracing::info!(
        contact_id = member.id,
        root,
        "relinked chained contact to root"
      );
    }
  }

  let new_email = email.is_some_and(|e| {
    !cluster.iter().any(|c| c.email.as_deref() == Some(e))
  });
  let new_phone = phone.is_some_and(|p| {
    !cluster.iter().any(|c| c.phone_number.as_deref() == Some(p))
  });

  let outcome = if new_email || new_phone {
    let contact = repo.insert(NewContact::secondary(
      request.email.clone(),
      request.phone_number.clone(),
      root,
    ))?;
    tracing::info!(
      contact_id = contact.id,
      root,
      new_email,
      new_phone,
      "created secondary contact"
    );
    // Every member now links directly at the root.
    cluster = repo.find_cluster(root)?;
    Outcome::CreatedSecondary(contact.id)
  } else {
    tracing::debug!(root, "no new identifiers");
    Outcome::Existing
  };

  Ok(Resolution {
    identity: ConsolidatedIdentity::from_cluster(root, &cluster),
    outcome,
    demoted,
  })
}

/// The consolidated view of the cluster containing contact `id`, or `None`
/// if no such contact exists. Performs no writes.
pub fn consolidate<R: ContactRepository>(
  repo: &R,
  id: ContactId,
) -> Result<Option<ConsolidatedIdentity>, R::Error> {
  let Some(contact) = repo.find_by_id(id)? else {
    return Ok(None);
  };
  let root = follow_to_root(repo, contact)?;
  let cluster = gather_cluster(repo, root.id)?;
  Ok(Some(ConsolidatedIdentity::from_cluster(root.id, &cluster)))
}

/// Distinct primaries reached from a match set, keyed (and so ordered) by id.
///
/// A matched primary is its own root and costs no read. A matched secondary
/// costs one read per distinct link target.
fn matched_roots<R: ContactRepository>(
  repo: &R,
  matches: &[Contact],
) -> Result<BTreeMap<ContactId, Contact>, R::Error> {
  let candidates: BTreeSet<ContactId> =
    matches.iter().map(Contact::root_candidate).collect();

  let mut roots = BTreeMap::new();
  for candidate in candidates {
    let start = match matches.iter().find(|c| c.id == candidate) {
      Some(c) => c.clone(),
      None => {
        let from = matches
          .iter()
          .find(|c| c.root_candidate() == candidate)
          .map_or(candidate, |c| c.id);
        repo
          .find_by_id(candidate)?
          .ok_or(Error::DanglingLink { from, to: candidate })?
      }
    };

    let root = follow_to_root(repo, start)?;
    roots.insert(root.id, root);
  }
  Ok(roots)
}

/// Walk `linked_id` references from `start` until a primary is reached.
fn follow_to_root<R: ContactRepository>(
  repo: &R,
  start: Contact,
) -> Result<Contact, R::Error> {
  let mut current = start;
  let mut seen = HashSet::new();
  while !current.is_primary() {
    if !seen.insert(current.id) {
      return Err(Error::LinkCycle(current.id).into());
    }
    let next = current.linked_id.ok_or(Error::InvalidLink {
      precedence: current.link_precedence,
      linked_id:  None,
    })?;
    current = repo
      .find_by_id(next)?
      .ok_or(Error::DanglingLink { from: current.id, to: next })?;
  }
  Ok(current)
}

/// Every contact reachable from `root` through `linked_id` references,
/// however deep. The root comes first.
///
/// Costs one read per secondary on top of the root's own cluster read.
fn gather_cluster<R: ContactRepository>(
  repo: &R,
  root: ContactId,
) -> Result<Vec<Contact>, R::Error> {
  let mut cluster = repo.find_cluster(root)?;
  cluster.sort_by_key(|c| c.id != root);
  let mut seen: HashSet<ContactId> = cluster.iter().map(|c| c.id).collect();
  let mut pending: Vec<ContactId> =
    cluster.iter().skip(1).map(|c| c.id).collect();

  while let Some(parent) = pending.pop() {
    for child in repo.find_cluster(parent)? {
      if seen.insert(child.id) {
        pending.push(child.id);
        cluster.push(child);
      }
    }
  }
  Ok(cluster)
}

/// Demote primary `absorbed` under `root` and re-parent its secondaries.
fn merge_into<R: ContactRepository>(
  repo: &mut R,
  root: ContactId,
  absorbed: ContactId,
) -> Result<(), R::Error> {
  let members = repo.find_cluster(absorbed)?;
  for member in &members {
    repo.update_link(member.id, LinkPrecedence::Secondary, Some(root))?;
  }
  tracing::info!(
    root,
    absorbed,
    relinked = members.len(),
    "merged identity clusters"
  );
  Ok(())
}
