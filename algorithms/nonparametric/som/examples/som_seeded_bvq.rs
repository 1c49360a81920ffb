use bvq::{BvqClassifier, ConfusionMatrix, union_code_vectors};
use log::info;
use ndarray::array;
use riskvq_helpers::{
    BasicPointFactory, DataSource, Label, LabeledPoint, PointFactory, VecDataSource,
};
use som::{SomGrid, SomParams};

/// Points scattered uniformly in a square of side `spread` around `center`.
fn blob(
    factory: &mut BasicPointFactory<f64>,
    center: [f64; 2],
    spread: f64,
    count: usize,
    label: &Label,
) -> Vec<LabeledPoint<f64>> {
    (0..count)
        .map(|_| {
            let x = center[0] + spread * (factory.random_feature_value() - 0.5);
            let y = center[1] + spread * (factory.random_feature_value() - 0.5);
            factory.new_labeled_point(array![x, y], label.clone())
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Missing a "rare" point costs ten times more than a false alarm.
    let common = Label::new("common");
    let rare = Label::new("rare");
    let common = common.with_risk(&rare, 0.1);
    let rare = rare.with_risk(&common, 1.0);

    let mut factory = BasicPointFactory::seeded(42);
    let mut points = blob(&mut factory, [0.35, 0.35], 0.5, 900, &common);
    points.extend(blob(&mut factory, [0.65, 0.65], 0.4, 100, &rare));
    let mut source = VecDataSource::seeded(points, 7);
    let bounds = source.normalize()?;
    info!("{} training points, feature bounds {:?}", source.len(), bounds);

    let params = SomParams::new(20_000, 0.1, 1.0);
    let mut grids = Vec::new();
    for label in [&common, &rare] {
        let mut grid = SomGrid::from_source(BasicPointFactory::seeded(1), 9, &mut source, Some(label))?;
        grid.fit(&mut source, Some(label), &params)?;
        info!(
            "SOM for {}: separation {:.3}, distribution {:?}",
            label,
            grid.separation()?,
            grid.distribution(source.points())?
        );
        grids.push(grid.to_code_vectors(label));
    }

    let mut bvq = BvqClassifier::new(union_code_vectors(grids));
    let test = source.points().to_vec();

    let mut before = ConfusionMatrix::new();
    bvq.evaluate(&test, &mut before)?;
    info!(
        "1-NN on SOM prototypes: accuracy {:.3}, rare recall {:.3}",
        before.accuracy(),
        before.recall(&rare)
    );

    let updates = bvq.fit(&mut source, 0.1, 200_000, 0.2)?;
    let mut after = ConfusionMatrix::new();
    bvq.evaluate(&test, &mut after)?;
    info!(
        "BVQ after {} updates: accuracy {:.3}, rare recall {:.3}, rare precision {:.3}",
        updates,
        after.accuracy(),
        after.recall(&rare),
        after.precision(&rare)
    );
    Ok(())
}
