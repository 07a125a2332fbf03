//! Test dei repository contro un database SQLite in-memory:
//! invarianti della coppia di partecipanti, contatori non letti,
//! paginazione del ledger e ricevute di lettura.

mod common;

#[cfg(test)]
mod repository_tests {
    use super::common::*;
    use chrono::{Duration, Utc};
    use novachat_server::entities::message::TOMBSTONE;

    /// Xorshift deterministico per gli interleaving casuali ma riproducibili
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }
    }

    // ============================================================
    // ChatRepository - coppia ordinata e ciclo di vita
    // ============================================================

    #[tokio::test]
    async fn test_get_or_create_normalizes_the_pair() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;

        let first = state
            .chat
            .get_or_create(bob.user_id, alice.user_id)
            .await
            .unwrap();
        assert!(first.user_low < first.user_high);
        assert!(first.is_participant(alice.user_id));
        assert!(first.is_participant(bob.user_id));
        assert_eq!(first.other_participant(alice.user_id), bob.user_id);

        // entrambe le direzioni convergono sulla stessa riga
        let second = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();
        assert_eq!(second.chat_id, first.chat_id);
    }

    #[tokio::test]
    async fn test_deactivated_chat_is_invisible_but_preserved() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;

        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();
        state.chat.deactivate(&chat.chat_id).await.unwrap();

        assert!(
            state
                .chat
                .find_for_participant(&chat.chat_id, &alice.user_id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            state
                .chat
                .list_for_user(&alice.user_id)
                .await
                .unwrap()
                .is_empty()
        );

        // la riga resta leggibile per id: lo storico non si perde
        let row = state.chat.read(&chat.chat_id).await.unwrap().unwrap();
        assert!(!row.is_active);
    }

    // ============================================================
    // Contatori non letti - interleaving casuale riproducibile
    // ============================================================

    #[tokio::test]
    async fn test_unread_counter_survives_random_interleavings() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let mut rng = XorShift(0x5EED_CAFE);
        let mut expected: i64 = 0;

        for _ in 0..60 {
            if rng.next() % 4 == 0 {
                state
                    .chat
                    .reset_unread(&chat.chat_id, &bob.user_id)
                    .await
                    .unwrap();
                expected = 0;
            } else {
                state
                    .chat
                    .increment_unread(&chat.chat_id, &bob.user_id)
                    .await
                    .unwrap();
                expected += 1;
            }

            assert_eq!(
                state
                    .chat
                    .unread_count(&chat.chat_id, &bob.user_id)
                    .await
                    .unwrap(),
                expected
            );
        }

        // il contatore di Alice non è mai stato toccato
        assert_eq!(
            state
                .chat
                .unread_count(&chat.chat_id, &alice.user_id)
                .await
                .unwrap(),
            0
        );
    }

    // ============================================================
    // MessageRepository - ledger, paginazione, ricevute
    // ============================================================

    #[tokio::test]
    async fn test_page_round_trip_has_no_gaps_or_duplicates() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let mut sent = Vec::new();
        for i in 1..=10 {
            let message = state
                .msg
                .append(&chat.chat_id, &alice.user_id, &format!("msg {}", i))
                .await
                .unwrap();
            sent.push(message.message_id);
        }

        let mut reconstructed = Vec::new();
        for page in (1..=3).rev() {
            let messages = state.msg.page(&chat.chat_id, page, 4).await.unwrap();
            // dentro la pagina: vecchio -> nuovo
            for window in messages.windows(2) {
                assert!(window[0].message_id < window[1].message_id);
            }
            reconstructed.extend(messages.into_iter().map(|m| m.message_id));
        }

        assert_eq!(reconstructed, sent);
    }

    #[tokio::test]
    async fn test_append_seeds_the_sender_receipt() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let message = state
            .msg
            .append(&chat.chat_id, &alice.user_id, "ciao")
            .await
            .unwrap();

        let reads = state.msg.reads_for_message(&message.message_id).await.unwrap();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].user_id, alice.user_id);

        // il proprio messaggio non è mai "non letto"
        assert!(
            state
                .msg
                .find_unread_ids(&chat.chat_id, &alice.user_id)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            state
                .msg
                .find_unread_ids(&chat.chat_id, &bob.user_id)
                .await
                .unwrap(),
            vec![message.message_id]
        );
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_identity_and_position() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;
        let bob = seed_user(&state, "bob").await;
        let chat = state
            .chat
            .get_or_create(alice.user_id, bob.user_id)
            .await
            .unwrap();

        let message = state
            .msg
            .append(&chat.chat_id, &alice.user_id, "da cancellare")
            .await
            .unwrap();

        // solo il mittente
        assert!(
            !state
                .msg
                .soft_delete(&message.message_id, &bob.user_id)
                .await
                .unwrap()
        );
        assert!(
            state
                .msg
                .soft_delete(&message.message_id, &alice.user_id)
                .await
                .unwrap()
        );

        let row = state.msg.read(&message.message_id).await.unwrap().unwrap();
        assert!(row.is_deleted);
        assert_eq!(row.content, TOMBSTONE);
        assert_eq!(row.sender_id, alice.user_id);
        assert_eq!(row.created_at, message.created_at);

        // il tombstone resta nel conteggio e in pagina
        assert_eq!(state.msg.count_for_chat(&chat.chat_id).await.unwrap(), 1);
    }

    // ============================================================
    // UserRepository - ciclo di vita del chat link
    // ============================================================

    #[tokio::test]
    async fn test_chat_link_set_lookup_and_clear() {
        let state = create_test_state().await;
        let alice = seed_user(&state, "alice").await;

        let expires_at = Utc::now() + Duration::minutes(60);
        state
            .user
            .set_chat_link(&alice.user_id, "ABCD1234", &expires_at)
            .await
            .unwrap();

        let found = state
            .user
            .find_by_chat_link_code("ABCD1234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, alice.user_id);
        let link = found.chat_link().unwrap();
        assert_eq!(link.code, "ABCD1234");
        assert!(!link.is_expired(Utc::now()));

        state.user.clear_chat_link(&alice.user_id).await.unwrap();
        assert!(
            state
                .user
                .find_by_chat_link_code("ABCD1234")
                .await
                .unwrap()
                .is_none()
        );
        let reloaded = state.user.find_by_id(&alice.user_id).await.unwrap().unwrap();
        assert!(reloaded.chat_link().is_none());
    }
}
