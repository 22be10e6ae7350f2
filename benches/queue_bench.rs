use criterion::measurement::WallTime;
use criterion::{BenchmarkGroup, BenchmarkId, Criterion, criterion_group, criterion_main};
use mpmc_bench::{BlockingQueue, CounterSet, QueueKind, Token};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

const KINDS: [QueueKind; 2] = [QueueKind::Bounded, QueueKind::Channel];

fn bench_queue_operations(c: &mut Criterion) {
    let mut group: BenchmarkGroup<WallTime> = c.benchmark_group("blocking_queue");

    for kind in KINDS {
        group.bench_function(BenchmarkId::new("put_take_single_thread", kind), |b| {
            let queue: Arc<dyn BlockingQueue<Token>> = kind.build(1024).unwrap();

            b.iter(|| {
                queue.put(black_box(42)).unwrap();
                black_box(queue.take().unwrap());
            });
        });

        group.bench_function(BenchmarkId::new("spsc_threaded", kind), |b| {
            b.iter(|| {
                let queue: Arc<dyn BlockingQueue<Token>> = kind.build(1024).unwrap();
                let producer_queue: Arc<dyn BlockingQueue<Token>> = Arc::clone(&queue);
                let consumer_queue: Arc<dyn BlockingQueue<Token>> = Arc::clone(&queue);

                let producer: JoinHandle<()> = thread::spawn(move || {
                    for i in 0..1000 {
                        producer_queue.put(i).unwrap();
                    }
                });

                let consumer: JoinHandle<()> = thread::spawn(move || {
                    for _ in 0..1000 {
                        black_box(consumer_queue.take().unwrap());
                    }
                });

                producer.join().unwrap();
                consumer.join().unwrap();
            });
        });
    }

    group.finish();
}

fn bench_counter_increment(c: &mut Criterion) {
    let (_set, handles) = CounterSet::new(1);

    c.bench_function("padded_counter_increment", |b| {
        b.iter(|| handles[0].increment());
    });

    c.bench_function("counter_set_sum_64", |b| {
        let (set64, _handles64) = CounterSet::new(64);
        b.iter(|| black_box(set64.sum()));
    });
}

criterion_group!(benches, bench_queue_operations, bench_counter_increment);
criterion_main!(benches);
