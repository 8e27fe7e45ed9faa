use std::net::IpAddr;

use passlink_autologin::domain::types::{DenyReason, FailureKey, MAX_FAILED_ATTEMPTS, Verdict};
use passlink_autologin::hash::code_hash;
use passlink_autologin::token::encode_token;
use passlink_autologin::usecase::issue::{AllowAll, IssueTokenInput, IssueTokenUseCase};
use passlink_autologin::usecase::verify::{VerifyTokenInput, VerifyTokenUseCase};

use crate::helpers::{
    MockCodeStore, MockFailureStore, MockUserDirectory, TEST_SALT, code_record, limiter,
};

fn test_ip() -> IpAddr {
    "198.51.100.7".parse().unwrap()
}

fn verifier(
    codes: MockCodeStore,
    failures: MockFailureStore,
    users: MockUserDirectory,
) -> VerifyTokenUseCase<MockCodeStore, MockFailureStore, MockUserDirectory> {
    VerifyTokenUseCase {
        codes,
        limiter: limiter(failures),
        users,
        code_salt: TEST_SALT.to_owned(),
    }
}

fn request(raw_token: &str) -> VerifyTokenInput {
    VerifyTokenInput {
        raw_token: raw_token.to_owned(),
        source_ip: Some(test_ip()),
        current_user_id: None,
    }
}

#[tokio::test]
async fn should_grant_token_issued_through_the_facade() {
    let codes = MockCodeStore::empty();
    let failures = MockFailureStore::empty();
    let users = MockUserDirectory::new(vec![42]);

    let issue = IssueTokenUseCase {
        codes: codes.clone(),
        users: users.clone(),
        policy: AllowAll,
        code_salt: TEST_SALT.to_owned(),
        default_ttl_secs: 900,
    };
    let issued = issue
        .execute(IssueTokenInput {
            user_id: 42,
            ttl_seconds: Some(3600),
        })
        .await
        .unwrap();
    assert!(issued.token.starts_with("42~"));

    let uc = verifier(codes, failures.clone(), users);
    let verdict = uc.execute(request(&issued.token)).await;

    assert_eq!(verdict, Verdict::Granted { user_id: 42 });
    assert!(failures.is_empty(), "success must not move any counter");
}

#[tokio::test]
async fn should_deny_replayed_token_after_consumption() {
    let codes = MockCodeStore::with(vec![code_record(42, "S3cretS3cretS3cret", 300)]);
    let failures = MockFailureStore::empty();
    let users = MockUserDirectory::new(vec![42]);
    let token = encode_token(42, "S3cretS3cretS3cret");

    let uc = verifier(codes.clone(), failures.clone(), users);

    let first = uc.execute(request(&token)).await;
    assert_eq!(first, Verdict::Granted { user_id: 42 });
    assert_eq!(codes.len(), 0, "consumption must delete the record");

    let second = uc.execute(request(&token)).await;
    assert_eq!(
        second,
        Verdict::Denied {
            reason: DenyReason::InvalidOrExpired
        }
    );
    assert_eq!(failures.count_for(&FailureKey::User(42)), 1);
}

#[tokio::test]
async fn should_deny_expired_code() {
    let codes = MockCodeStore::with(vec![code_record(7, "OldSecretOldSecret", -5)]);
    let uc = verifier(
        codes,
        MockFailureStore::empty(),
        MockUserDirectory::new(vec![7]),
    );

    let verdict = uc.execute(request(&encode_token(7, "OldSecretOldSecret"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::InvalidOrExpired
        }
    );
}

#[tokio::test]
async fn should_reject_malformed_tokens_before_the_store() {
    let codes = MockCodeStore::empty();
    let failures = MockFailureStore::empty();
    let uc = verifier(codes.clone(), failures.clone(), MockUserDirectory::empty());

    for raw in ["abc~xyz", "123", "123~!!!", ""] {
        let verdict = uc.execute(request(raw)).await;
        assert_eq!(
            verdict,
            Verdict::Denied {
                reason: DenyReason::Malformed
            },
            "accepted {raw:?}"
        );
    }

    assert_eq!(codes.lookup_count(), 0, "malformed input must not reach the store");
    // Attributed to the source ip only; no user id can be trusted.
    let ip_key = FailureKey::Ip(test_ip().to_string());
    assert_eq!(failures.count_for(&ip_key), 4);
    assert!(
        failures
            .metadata_for(&ip_key)
            .iter()
            .all(|detail| detail.starts_with("malformed:")),
        "ip metadata should carry the malformed payloads"
    );
    assert_eq!(failures.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_deny_correct_code_from_blocked_ip() {
    let codes = MockCodeStore::with(vec![code_record(42, "RightAnswerRight", 300)]);
    let failures =
        MockFailureStore::with_count(FailureKey::Ip(test_ip().to_string()), MAX_FAILED_ATTEMPTS);
    let uc = verifier(codes.clone(), failures, MockUserDirectory::new(vec![42]));

    let verdict = uc.execute(request(&encode_token(42, "RightAnswerRight"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::IpBlocked
        }
    );
    assert_eq!(codes.lookup_count(), 0, "blocked callers must not reach the store");
    assert!(codes.contains(&code_hash(42, "RightAnswerRight")));
}

#[tokio::test]
async fn should_deny_correct_code_for_blocked_user() {
    let codes = MockCodeStore::with(vec![code_record(42, "RightAnswerRight", 300)]);
    let failures = MockFailureStore::with_count(FailureKey::User(42), MAX_FAILED_ATTEMPTS);
    let uc = verifier(codes.clone(), failures, MockUserDirectory::new(vec![42]));

    let verdict = uc.execute(request(&encode_token(42, "RightAnswerRight"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::UserBlocked
        }
    );
    assert_eq!(codes.lookup_count(), 0);
}

#[tokio::test]
async fn should_lock_user_out_after_repeated_wrong_codes() {
    let codes = MockCodeStore::with(vec![code_record(42, "RightAnswerRight", 300)]);
    let failures = MockFailureStore::empty();
    let users = MockUserDirectory::new(vec![42]);
    let uc = verifier(codes.clone(), failures.clone(), users);

    for _ in 0..MAX_FAILED_ATTEMPTS {
        let verdict = uc.execute(request(&encode_token(42, "WrongAnswerWrong"))).await;
        assert_eq!(
            verdict,
            Verdict::Denied {
                reason: DenyReason::InvalidOrExpired
            }
        );
    }

    // The real code no longer helps.
    let verdict = uc.execute(request(&encode_token(42, "RightAnswerRight"))).await;
    assert!(matches!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::IpBlocked | DenyReason::UserBlocked
        }
    ));
    assert!(codes.contains(&code_hash(42, "RightAnswerRight")));
}

#[tokio::test]
async fn should_shortcircuit_when_already_authenticated() {
    let codes = MockCodeStore::with(vec![code_record(42, "S3cretS3cretS3cret", 300)]);
    let failures = MockFailureStore::empty();
    let uc = verifier(codes.clone(), failures.clone(), MockUserDirectory::new(vec![42]));

    let verdict = uc
        .execute(VerifyTokenInput {
            raw_token: encode_token(42, "S3cretS3cretS3cret"),
            source_ip: Some(test_ip()),
            current_user_id: Some(42),
        })
        .await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::AlreadyAuthenticated
        }
    );
    assert_eq!(codes.lookup_count(), 0, "no store work for a signed-in user");
    assert!(codes.contains(&code_hash(42, "S3cretS3cretS3cret")), "code must stay unconsumed");
    assert!(failures.is_empty(), "not an attack signal, no counter moves");
}

#[tokio::test]
async fn should_verify_for_a_different_user_while_authenticated() {
    // Signed in as 7, clicking a link for 42: the short-circuit only applies
    // when the identities match.
    let codes = MockCodeStore::with(vec![code_record(42, "S3cretS3cretS3cret", 300)]);
    let uc = verifier(
        codes,
        MockFailureStore::empty(),
        MockUserDirectory::new(vec![7, 42]),
    );

    let verdict = uc
        .execute(VerifyTokenInput {
            raw_token: encode_token(42, "S3cretS3cretS3cret"),
            source_ip: Some(test_ip()),
            current_user_id: Some(7),
        })
        .await;

    assert_eq!(verdict, Verdict::Granted { user_id: 42 });
}

#[tokio::test]
async fn should_deny_closed_when_code_store_is_down() {
    let uc = verifier(
        MockCodeStore::broken(),
        MockFailureStore::empty(),
        MockUserDirectory::new(vec![42]),
    );

    let verdict = uc.execute(request(&encode_token(42, "S3cretS3cretS3cret"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::StoreUnavailable
        }
    );
}

#[tokio::test]
async fn should_deny_closed_when_the_limiter_is_down() {
    // A correct code with an unreachable failure store: the block checks
    // cannot run, so the attempt fails closed instead of skipping them.
    let codes = MockCodeStore::with(vec![code_record(42, "S3cretS3cretS3cret", 300)]);
    let uc = verifier(
        codes.clone(),
        MockFailureStore::broken(),
        MockUserDirectory::new(vec![42]),
    );

    let verdict = uc.execute(request(&encode_token(42, "S3cretS3cretS3cret"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::StoreUnavailable
        }
    );
    assert!(codes.contains(&code_hash(42, "S3cretS3cretS3cret")), "code must stay unconsumed");
}

#[tokio::test]
async fn should_deny_when_account_no_longer_exists() {
    let codes = MockCodeStore::with(vec![code_record(42, "S3cretS3cretS3cret", 300)]);
    let failures = MockFailureStore::empty();
    let uc = verifier(codes, failures.clone(), MockUserDirectory::empty());

    let verdict = uc.execute(request(&encode_token(42, "S3cretS3cretS3cret"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::InvalidOrExpired
        }
    );
    assert_eq!(failures.count_for(&FailureKey::User(42)), 1);
}

#[tokio::test]
async fn should_deny_when_record_binds_to_another_account() {
    // A record whose user_hash was written with a different salt cannot be
    // re-derived; treat it like any wrong code.
    let mut record = code_record(42, "S3cretS3cretS3cret", 300);
    record.user_hash = "0".repeat(64);
    let uc = verifier(
        MockCodeStore::with(vec![record]),
        MockFailureStore::empty(),
        MockUserDirectory::new(vec![42]),
    );

    let verdict = uc.execute(request(&encode_token(42, "S3cretS3cretS3cret"))).await;

    assert_eq!(
        verdict,
        Verdict::Denied {
            reason: DenyReason::InvalidOrExpired
        }
    );
}

#[tokio::test]
async fn should_verify_without_a_source_ip() {
    // No transport address: user-keyed throttling still applies, and the
    // happy path still works.
    let codes = MockCodeStore::with(vec![code_record(42, "S3cretS3cretS3cret", 300)]);
    let uc = verifier(
        codes,
        MockFailureStore::empty(),
        MockUserDirectory::new(vec![42]),
    );

    let verdict = uc
        .execute(VerifyTokenInput {
            raw_token: encode_token(42, "S3cretS3cretS3cret"),
            source_ip: None,
            current_user_id: None,
        })
        .await;

    assert_eq!(verdict, Verdict::Granted { user_id: 42 });
}
