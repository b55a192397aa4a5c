use std::sync::OnceLock;

use aio::{CompletionQueue, Engine, EngineConfig, IoBuffer, OpenMode, Tag, Timeout};
use proptest::prelude::*;
use test_support::{patterned_bytes, scratch_dir, write_fixture};

fn shared_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(|| Engine::new(EngineConfig::default().with_worker_threads(2)).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reads_report_consistent_lengths(
        file_len in 0usize..4096,
        offset in 0u64..5000,
        len in 0usize..2048,
    ) {
        let dir = scratch_dir();
        let contents = patterned_bytes(file_len);
        let path = write_fixture(dir.path(), "data.bin", &contents).unwrap();
        let queue = CompletionQueue::new();

        let handle = shared_engine().open(&path, OpenMode::Read).unwrap();
        handle.submit_read(IoBuffer::zeroed(len), offset, &queue, Tag::None).unwrap();
        handle.submit_close(false, &queue, Tag::None).unwrap();

        let mut read = queue.try_wait_next(Timeout::INFINITE).unwrap();
        let start = (offset as usize).min(file_len);
        let expected = &contents[start..(start + len).min(file_len)];

        prop_assert!(read.transferred() <= read.requested());
        prop_assert_eq!(read.requested(), len);
        prop_assert_eq!(read.buffer().len(), read.transferred());
        prop_assert_eq!(read.buffer(), expected);
        read.release();

        queue.try_wait_next(Timeout::INFINITE).unwrap().release();
    }

    #[test]
    fn writes_land_at_their_offset(
        prefix in 0usize..512,
        len in 1usize..1024,
    ) {
        let dir = scratch_dir();
        let path = dir.path().join("out.bin");
        let payload = patterned_bytes(len);
        let queue = CompletionQueue::new();

        let handle = shared_engine().open(&path, OpenMode::ReadWriteTruncate).unwrap();
        handle
            .submit_write(IoBuffer::from(payload.clone()), prefix as u64, &queue, Tag::None)
            .unwrap();
        handle.submit_close(true, &queue, Tag::None).unwrap();

        let mut write = queue.try_wait_next(Timeout::INFINITE).unwrap();
        prop_assert_eq!(write.transferred(), len);
        prop_assert_eq!(write.buffer(), &payload[..]);
        write.release();
        queue.try_wait_next(Timeout::INFINITE).unwrap().release();

        let on_disk = std::fs::read(&path).unwrap();
        prop_assert_eq!(on_disk.len(), prefix + len);
        prop_assert!(on_disk[..prefix].iter().all(|&b| b == 0));
        prop_assert_eq!(&on_disk[prefix..], &payload[..]);
    }
}
