#![cfg(feature = "inmem-store")]

use naymer::{
    models::*,
    repo::{inmem::InMemRepo, RepoError},
};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use naymer::repo::{CategoryRepo, FavoriteRepo, InteractionRepo, ListingRepo, ProfileRepo, ReviewRepo};
use uuid::Uuid;

/// Helper that returns a fresh, empty repository for every test run.
fn repo() -> InMemRepo {
    InMemRepo::new()
}

fn draft(owner: Id, title: &str, status: ListingStatus) -> ListingDraft {
    ListingDraft {
        user_id: owner,
        title: title.into(),
        description: String::new(),
        category_id: Uuid::nil(),
        price_list: vec![PriceItem { name: None, price: "100".into() }],
        geo_position: None,
        working_hours: None,
        status,
        kind: ListingKind::Regular,
        expires_at: None,
        image_url: None,
    }
}

#[tokio::test]
async fn listing_crud_and_status_filter() {
    let r = repo();
    let owner = Uuid::new_v4();

    // starts empty
    assert!(r.list_listings(None).await.unwrap().is_empty());

    let a = r.create_listing(draft(owner, "Lamp", ListingStatus::Check)).await.unwrap();
    let b = r.create_listing(draft(owner, "Chair", ListingStatus::Active)).await.unwrap();
    assert_eq!(r.list_listings(None).await.unwrap().len(), 2);

    let active = r.list_listings(Some(ListingStatus::Active)).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, b.id);

    // update replaces content
    let mut d = draft(owner, "Desk lamp", ListingStatus::Check);
    d.description = "brass".into();
    let updated = r.update_listing(a.id, d).await.unwrap();
    assert_eq!(updated.title, "Desk lamp");
    assert_eq!(updated.created_at, a.created_at);

    let closed = r.set_listing_status(b.id, ListingStatus::Inactive).await.unwrap();
    assert_eq!(closed.status, ListingStatus::Inactive);

    // unknown ids
    let missing = Uuid::new_v4();
    assert!(matches!(r.get_listing(missing).await.unwrap_err(), RepoError::NotFound));
    assert!(matches!(
        r.set_listing_status(missing, ListingStatus::Active).await.unwrap_err(),
        RepoError::NotFound
    ));
}

#[tokio::test]
async fn paging_and_lookup_by_ids() {
    let r = repo();
    let owner = Uuid::new_v4();
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(r.create_listing(draft(owner, &format!("item {i}"), ListingStatus::Active)).await.unwrap().id);
    }
    let page = r.page_listings(ListingStatus::Active, 1, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    let past_end = r.page_listings(ListingStatus::Active, 10, 2).await.unwrap();
    assert!(past_end.is_empty());

    let picked = r.list_listings_by_ids(&[ids[0], ids[3], Uuid::new_v4()]).await.unwrap();
    assert_eq!(picked.len(), 2);
    assert_eq!(r.list_listings_by_owner(owner).await.unwrap().len(), 5);
}

#[tokio::test]
async fn review_lifecycle() {
    let r = repo();
    let owner = Uuid::new_v4();
    let author = Uuid::new_v4();
    let listing = r.create_listing(draft(owner, "Bike", ListingStatus::Active)).await.unwrap();

    assert!(r.find_review(author, listing.id).await.unwrap().is_none());
    let review = r
        .create_review(NewReview { listing_id: listing.id, author_id: author, rating: 4, text: Some("ok".into()) })
        .await
        .unwrap();
    assert_eq!(review.status, ReviewStatus::Active);
    assert!(!review.verified);
    assert!(r.find_review(author, listing.id).await.unwrap().is_some());

    let reported = r.set_review_status(review.id, ReviewStatus::Reported, None).await.unwrap();
    assert_eq!(reported.status, ReviewStatus::Reported);
    assert_eq!(r.list_reviews_by_status(ReviewStatus::Reported).await.unwrap().len(), 1);
    assert!(r
        .list_reviews_for_listing(listing.id, Some(ReviewStatus::Active))
        .await
        .unwrap()
        .is_empty());

    let approved = r.set_review_status(review.id, ReviewStatus::Active, Some(true)).await.unwrap();
    assert!(approved.verified);

    r.delete_review(review.id).await.unwrap();
    assert!(matches!(r.get_review(review.id).await.unwrap_err(), RepoError::NotFound));

    // reviews need an existing listing
    let err = r
        .create_review(NewReview { listing_id: Uuid::new_v4(), author_id: author, rating: 5, text: None })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn profile_upsert_keeps_reputation() {
    let r = repo();
    let id = Uuid::new_v4();
    assert!(matches!(r.set_reputation(id, 3).await.unwrap_err(), RepoError::NotFound));

    r.upsert_profile(NewProfile { user_id: id, name: Some("Ann".into()), email: None, role: ProfileRole::User })
        .await
        .unwrap();
    r.set_reputation(id, 4).await.unwrap();
    let p = r
        .upsert_profile(NewProfile { user_id: id, name: Some("Anna".into()), email: None, role: ProfileRole::User })
        .await
        .unwrap();
    assert_eq!(p.name.as_deref(), Some("Anna"));
    assert_eq!(p.reputation_score, 4);

    let p = r
        .update_profile(id, UpdateProfile { phone_number: Some("+7 900 000-00-00".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(p.name.as_deref(), Some("Anna"));
    assert!(p.phone_number.is_some());
}

#[tokio::test]
async fn positions_and_hours_are_stored() {
    let r = repo();
    let id = Uuid::new_v4();
    r.upsert_profile(NewProfile { user_id: id, name: None, email: None, role: ProfileRole::User })
        .await
        .unwrap();
    let p = r
        .update_profile(id, UpdateProfile { geo_position: Some(GeoPoint::new(37.6, 55.7)), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(p.geo_position, Some(GeoPoint::new(37.6, 55.7)));
    // absent fields leave the position alone
    let p = r.update_profile(id, UpdateProfile { name: Some("Ann".into()), ..Default::default() }).await.unwrap();
    assert!(p.geo_position.is_some());

    let mut d = draft(id, "Cafe", ListingStatus::Active);
    d.geo_position = Some(GeoPoint::new(30.3, 59.9));
    d.working_hours = Some(WorkingHours { days: Some(vec!["Mon".into(), "Tue".into()]), start: "09:00".into(), end: "18:00".into() });
    let l = r.create_listing(d.clone()).await.unwrap();
    assert_eq!(l.working_hours, d.working_hours);

    d.working_hours = None;
    let l = r.update_listing(l.id, d).await.unwrap();
    assert!(l.working_hours.is_none());
    assert_eq!(l.geo_position, Some(GeoPoint::new(30.3, 59.9)));
}

#[tokio::test]
async fn categories_unique_by_name() {
    let r = repo();
    assert!(r.list_categories().await.unwrap().is_empty());
    r.create_category("Tools").await.unwrap();
    r.create_category("bikes").await.unwrap();
    assert!(matches!(r.create_category("TOOLS").await.unwrap_err(), RepoError::Conflict));
    let names: Vec<_> = r.list_categories().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["bikes", "Tools"]);
}

#[tokio::test]
async fn favorites_and_interactions() {
    let r = repo();
    let user = Uuid::new_v4();
    let listing = r.create_listing(draft(Uuid::new_v4(), "Sofa", ListingStatus::Active)).await.unwrap();

    assert!(!r.is_favorite(user, listing.id).await.unwrap());
    r.add_favorite(user, listing.id).await.unwrap();
    assert!(matches!(r.add_favorite(user, listing.id).await.unwrap_err(), RepoError::Conflict));
    assert_eq!(r.list_favorite_listing_ids(user).await.unwrap(), vec![listing.id]);
    r.remove_favorite(user, listing.id).await.unwrap();
    assert!(matches!(r.remove_favorite(user, listing.id).await.unwrap_err(), RepoError::NotFound));

    assert!(!r.has_interaction(user, listing.id).await.unwrap());
    r.record_interaction(user, listing.id).await.unwrap();
    assert!(r.has_interaction(user, listing.id).await.unwrap());
    assert!(matches!(
        r.record_interaction(user, Uuid::new_v4()).await.unwrap_err(),
        RepoError::NotFound
    ));
}

#[tokio::test]
async fn deleting_listing_cascades() {
    let r = repo();
    let user = Uuid::new_v4();
    let listing = r.create_listing(draft(Uuid::new_v4(), "TV", ListingStatus::Active)).await.unwrap();
    r.record_interaction(user, listing.id).await.unwrap();
    r.add_favorite(user, listing.id).await.unwrap();
    let review = r
        .create_review(NewReview { listing_id: listing.id, author_id: user, rating: 2, text: None })
        .await
        .unwrap();

    r.delete_listing(listing.id).await.unwrap();
    assert!(matches!(r.get_review(review.id).await.unwrap_err(), RepoError::NotFound));
    assert!(r.list_favorite_listing_ids(user).await.unwrap().is_empty());
    assert!(!r.has_interaction(user, listing.id).await.unwrap());
    assert!(matches!(r.delete_listing(listing.id).await.unwrap_err(), RepoError::NotFound));
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let owner = Uuid::new_v4();
    let id = {
        let r = InMemRepo::with_snapshot_dir(dir.path());
        r.upsert_profile(NewProfile { user_id: owner, name: None, email: None, role: ProfileRole::User })
            .await
            .unwrap();
        r.create_listing(draft(owner, "Kettle", ListingStatus::Active)).await.unwrap().id
    };

    let reopened = InMemRepo::with_snapshot_dir(dir.path());
    assert_eq!(reopened.get_listing(id).await.unwrap().title, "Kettle");
    assert!(reopened.get_profile(owner).await.is_ok());
}

#[tokio::test]
async fn corrupt_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("state.json"), b"{not json").unwrap();
    let r = InMemRepo::with_snapshot_dir(dir.path());
    assert!(r.list_listings(None).await.unwrap().is_empty());
}
