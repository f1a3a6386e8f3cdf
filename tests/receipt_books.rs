use std::sync::Arc;

use fieldsales::{
    error::AppError,
    models::UserRole,
    receipt_book::ReceiptError,
    state::{
        NewCollectionRecord, NewReceiptBook, ReceiptBookChanges, consume_receipt_number,
        create_receipt_book, delete_receipt_book, get_receipt_book, list_collections,
        list_receipt_books, missing_receipt_numbers, receipt_book_stats, record_collection,
        update_receipt_book, validate_receipt_number,
    },
};

#[path = "common/mod.rs"]
mod common;

fn book_input(name: &str, start: i64, end: i64, rep: mongodb::bson::oid::ObjectId) -> NewReceiptBook {
    NewReceiptBook {
        book_name: name.to_string(),
        start_number: start,
        end_number: end,
        sales_rep: rep,
    }
}

#[tokio::test]
async fn books_are_only_assigned_to_sales_reps_of_the_tenant() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let other = common::new_tenant();

    let medical = common::add_user(&state, &tenant, "med@acme.test", UserRole::MedicalRep).await;
    let foreign_rep = common::add_user(&state, &other, "rep@other.test", UserRole::SalesRep).await;

    let err = create_receipt_book(&state, &tenant, book_input("B1", 1, 50, medical))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAssignee(_)), "{err:?}");

    let err = create_receipt_book(&state, &tenant, book_input("B1", 1, 50, foreign_rep))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAssignee(_)), "{err:?}");

    let err = create_receipt_book(&state, &tenant, book_input("B1", 50, 50, medical))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Receipt(ReceiptError::InvalidRange { start: 50, end: 50 })
    ));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn active_ranges_of_one_rep_cannot_overlap() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let colleague = common::add_user(&state, &tenant, "rep2@acme.test", UserRole::SalesRep).await;

    let first = create_receipt_book(&state, &tenant, book_input("B1", 100, 149, rep))
        .await
        .unwrap();

    let err = create_receipt_book(&state, &tenant, book_input("B2", 140, 199, rep))
        .await
        .unwrap_err();
    match err {
        AppError::RangeOverlap { existing, .. } => assert_eq!(existing, "B1"),
        other => panic!("expected overlap, got {other:?}"),
    }

    // another rep may hold the same numbers
    create_receipt_book(&state, &tenant, book_input("C1", 100, 149, colleague))
        .await
        .unwrap();

    let first_id = first.id.unwrap();
    update_receipt_book(
        &state,
        &tenant,
        &first_id,
        ReceiptBookChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    create_receipt_book(&state, &tenant, book_input("B2", 140, 199, rep))
        .await
        .unwrap();

    let err = update_receipt_book(
        &state,
        &tenant,
        &first_id,
        ReceiptBookChanges {
            is_active: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::RangeOverlap { .. }), "{err:?}");

    let reps_books = list_receipt_books(&state, &tenant, Some(&rep)).await.unwrap();
    assert_eq!(reps_books.len(), 2);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn consuming_numbers_tracks_cursor_gaps_and_completion() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let id = create_receipt_book(&state, &tenant, book_input("B1", 100, 103, rep))
        .await
        .unwrap()
        .id
        .unwrap();

    let (_, v) = validate_receipt_number(&state, &tenant, &id, 102).await.unwrap();
    assert!(v.is_valid);
    assert!(!v.is_sequential);
    let stored = get_receipt_book(&state, &tenant, &id).await.unwrap().unwrap();
    assert!(stored.used_numbers.is_empty(), "validation must not record");

    let (book, v) = consume_receipt_number(&state, &tenant, &id, 100, None).await.unwrap();
    assert!(v.is_sequential);
    assert_eq!(book.current_number, 101);

    let (book, v) = consume_receipt_number(&state, &tenant, &id, 103, None).await.unwrap();
    assert!(!v.is_sequential);
    assert_eq!(book.current_number, 101);

    let err = consume_receipt_number(&state, &tenant, &id, 103, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Receipt(ReceiptError::AlreadyUsed { number: 103 })
    ));
    let err = consume_receipt_number(&state, &tenant, &id, 104, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Receipt(ReceiptError::OutOfRange { .. })
    ));

    let stats = receipt_book_stats(&state, &tenant, &id).await.unwrap();
    assert_eq!(stats.used_count, 2);
    assert_eq!(stats.total_numbers, 4);
    assert_eq!(stats.sequential_breaks, 1);
    assert_eq!(stats.completion_percentage, 50);
    assert!(stats.missing_numbers.is_empty());

    consume_receipt_number(&state, &tenant, &id, 101, None).await.unwrap();
    let (book, v) = consume_receipt_number(&state, &tenant, &id, 102, None).await.unwrap();
    assert!(v.is_sequential);
    assert_eq!(book.current_number, 103);
    assert!(!book.is_completed);

    // every number is used but the cursor never passed the end
    let stats = receipt_book_stats(&state, &tenant, &id).await.unwrap();
    assert_eq!(stats.remaining_count, 0);
    assert_eq!(stats.completion_percentage, 100);
    assert!(!stats.is_completed);
    assert!(stats.all_numbers_used);

    let short = create_receipt_book(&state, &tenant, book_input("B2", 200, 201, rep))
        .await
        .unwrap()
        .id
        .unwrap();
    consume_receipt_number(&state, &tenant, &short, 200, None).await.unwrap();
    let (book, _) = consume_receipt_number(&state, &tenant, &short, 201, None).await.unwrap();
    assert!(book.is_completed);
    assert!(!book.is_active);

    let stored = get_receipt_book(&state, &tenant, &short).await.unwrap().unwrap();
    assert!(stored.is_completed);
    assert_eq!(stored.current_number, 202);
    assert_eq!(stored.used_numbers.len(), 2);

    let err = consume_receipt_number(&state, &tenant, &short, 201, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Receipt(ReceiptError::BookCompleted)));

    let err = update_receipt_book(
        &state,
        &tenant,
        &short,
        ReceiptBookChanges {
            book_name: Some("renamed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn numbers_ahead_of_the_cursor_are_not_missing() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let id = create_receipt_book(&state, &tenant, book_input("B1", 1, 10, rep))
        .await
        .unwrap()
        .id
        .unwrap();

    for n in [1, 2, 4] {
        consume_receipt_number(&state, &tenant, &id, n, None).await.unwrap();
    }
    // 4 was ahead of the cursor, so nothing is missing yet
    assert!(missing_receipt_numbers(&state, &tenant, &id).await.unwrap().is_empty());

    let err = update_receipt_book(
        &state,
        &tenant,
        &id,
        ReceiptBookChanges {
            end_number: Some(20),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn inactive_books_reject_consumption() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let id = create_receipt_book(&state, &tenant, book_input("B1", 1, 10, rep))
        .await
        .unwrap()
        .id
        .unwrap();
    update_receipt_book(
        &state,
        &tenant,
        &id,
        ReceiptBookChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = consume_receipt_number(&state, &tenant, &id, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Receipt(ReceiptError::BookInactive)));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn concurrent_consumers_record_a_number_once() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = Arc::new(ctx.state.clone());
    let tenant = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let id = create_receipt_book(&state, &tenant, book_input("B1", 1, 100, rep))
        .await
        .unwrap()
        .id
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let state = Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            consume_receipt_number(&state, &tenant, &id, 1, None).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::Receipt(ReceiptError::AlreadyUsed { number: 1 }))
            | Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(accepted, 1);

    let stored = get_receipt_book(&state, &tenant, &id).await.unwrap().unwrap();
    assert_eq!(stored.used_numbers.len(), 1);
    assert_eq!(stored.current_number, 2);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn books_with_collections_cannot_be_deleted() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let colleague = common::add_user(&state, &tenant, "rep2@acme.test", UserRole::SalesRep).await;

    let used = create_receipt_book(&state, &tenant, book_input("B1", 1, 10, rep))
        .await
        .unwrap()
        .id
        .unwrap();
    let unused = create_receipt_book(&state, &tenant, book_input("B2", 11, 20, rep))
        .await
        .unwrap()
        .id
        .unwrap();

    let err = record_collection(
        &state,
        &tenant,
        NewCollectionRecord {
            sales_rep: colleague,
            customer_name: "Farmacia Sol".into(),
            amount: 250.0,
            receipt_book: used,
            receipt_number: 1,
            notes: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidAssignee(_)), "{err:?}");

    let record = record_collection(
        &state,
        &tenant,
        NewCollectionRecord {
            sales_rep: rep,
            customer_name: "Farmacia Sol".into(),
            amount: 250.0,
            receipt_book: used,
            receipt_number: 1,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert!(record.is_sequential);

    let stored = get_receipt_book(&state, &tenant, &used).await.unwrap().unwrap();
    assert_eq!(stored.used_numbers[0].linked_request_id, record.id);
    assert_eq!(
        list_collections(&state, &tenant, Some(&used)).await.unwrap().len(),
        1
    );

    let err = delete_receipt_book(&state, &tenant, &used).await.unwrap_err();
    assert!(matches!(err, AppError::LinkedRecordsExist(1)), "{err:?}");

    delete_receipt_book(&state, &tenant, &unused).await.unwrap();
    assert!(get_receipt_book(&state, &tenant, &unused).await.unwrap().is_none());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn books_are_invisible_to_other_tenants() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let tenant = common::new_tenant();
    let other = common::new_tenant();
    let rep = common::add_user(&state, &tenant, "rep@acme.test", UserRole::SalesRep).await;
    let id = create_receipt_book(&state, &tenant, book_input("B1", 1, 10, rep))
        .await
        .unwrap()
        .id
        .unwrap();

    assert!(get_receipt_book(&state, &other, &id).await.unwrap().is_none());
    let err = consume_receipt_number(&state, &other, &id, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    let err = delete_receipt_book(&state, &other, &id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert!(list_receipt_books(&state, &other, None).await.unwrap().is_empty());

    common::teardown(Some(ctx)).await;
}
